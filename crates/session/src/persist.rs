// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session persistence: token set, pending logins, and the login-attempt
//! marker, saved as JSON with atomic writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Persisted state for the single session.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as epoch seconds; 0 means unknown.
    #[serde(default)]
    pub expires_at: u64,
    /// Interactive logins that redirected out and have not returned yet,
    /// keyed by their `state` nonce.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub pending_logins: HashMap<String, PendingLogin>,
}

/// PKCE material for a login awaiting its callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLogin {
    pub code_verifier: String,
    pub redirect_uri: String,
}

/// Resolve the state directory for session data.
///
/// Checks the explicit override, then `ANTEROOM_STATE_DIR`, then
/// `$XDG_STATE_HOME/anteroom`, then `$HOME/.local/state/anteroom`.
pub fn state_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("ANTEROOM_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("anteroom");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/anteroom");
    }
    PathBuf::from(".anteroom")
}

pub fn session_path(dir: &Path) -> PathBuf {
    dir.join("session.json")
}

fn marker_path(dir: &Path) -> PathBuf {
    dir.join("login-attempt")
}

/// Load the persisted session from a JSON file.
pub fn load(path: &Path) -> anyhow::Result<PersistedSession> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the persisted session atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) so concurrent saves cannot
/// race on the same `.tmp` file and leave trailing bytes behind.
pub fn save(path: &Path, session: &PersistedSession) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(session)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Record that a login redirect was initiated, so a reload landing
/// mid-handshake does not trigger a second redirect.
pub fn set_marker(dir: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(marker_path(dir), b"1")?;
    Ok(())
}

pub fn clear_marker(dir: &Path) {
    let _ = std::fs::remove_file(marker_path(dir));
}

pub fn marker_present(dir: &Path) -> bool {
    marker_path(dir).exists()
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
