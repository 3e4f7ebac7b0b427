// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serial_test::serial;

use super::*;

#[test]
fn save_and_load_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = session_path(dir.path());

    let mut session = PersistedSession {
        access_token: Some("at-1".into()),
        refresh_token: Some("rt-1".into()),
        expires_at: 1_900_000_000,
        ..Default::default()
    };
    session.pending_logins.insert(
        "state-1".into(),
        PendingLogin { code_verifier: "v".into(), redirect_uri: "http://localhost/cb".into() },
    );
    save(&path, &session)?;

    let loaded = load(&path)?;
    assert_eq!(loaded.access_token.as_deref(), Some("at-1"));
    assert_eq!(loaded.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(loaded.expires_at, 1_900_000_000);
    assert!(loaded.pending_logins.contains_key("state-1"));
    Ok(())
}

#[test]
fn save_creates_missing_directories() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested/deeper/session.json");
    save(&path, &PersistedSession::default())?;
    assert!(load(&path)?.access_token.is_none());
    Ok(())
}

#[test]
fn marker_set_and_clear() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(!marker_present(dir.path()));
    set_marker(dir.path())?;
    assert!(marker_present(dir.path()));
    clear_marker(dir.path());
    assert!(!marker_present(dir.path()));
    // Clearing twice is harmless.
    clear_marker(dir.path());
    Ok(())
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    std::env::set_var("ANTEROOM_STATE_DIR", "/tmp/anteroom-env");
    let explicit = PathBuf::from("/tmp/anteroom-explicit");
    assert_eq!(state_dir(Some(&explicit)), explicit);
    assert_eq!(state_dir(None), PathBuf::from("/tmp/anteroom-env"));
    std::env::remove_var("ANTEROOM_STATE_DIR");
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    std::env::remove_var("ANTEROOM_STATE_DIR");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    assert_eq!(state_dir(None), PathBuf::from("/tmp/xdg-state/anteroom"));
    std::env::remove_var("XDG_STATE_HOME");
}
