// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proactive token refresh: a single, self-rescheduling timer.
//!
//! The loop is `Idle → Scheduled → Firing → (Scheduled | ReauthTriggered)`.
//! Arming always cancels the previous handle, so at most one pending
//! firing exists at any instant; that is an invariant, not an
//! optimization.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::BrokerConfig;
use crate::controller::Inner;
use crate::error::FailureKind;
use crate::handshake;
use crate::persist;
use crate::store::SessionEvent;

/// Timing knobs for the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct RefreshKnobs {
    /// Refresh this many seconds before expiry.
    pub margin_secs: u64,
    /// Never fire sooner than this.
    pub min_delay_secs: u64,
    /// Poll interval for tokens without a parseable expiry.
    pub poll_secs: u64,
    /// Remaining validity below which a firing actually refreshes.
    pub min_validity_secs: u64,
}

impl RefreshKnobs {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self {
            margin_secs: config.refresh_margin_secs,
            min_delay_secs: config.min_refresh_delay_secs,
            poll_secs: config.fallback_poll_secs,
            min_validity_secs: config.min_validity_secs,
        }
    }
}

/// Current epoch seconds.
pub(crate) fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Compute the delay before the next refresh firing.
///
/// The firing lands `margin` before expiry, floored at `min_delay` so a
/// near-expiry token or clock skew cannot cause a refresh storm. A token
/// with no parseable expiry degrades to fixed polling.
pub fn compute_delay(now: u64, expires_at: Option<u64>, knobs: &RefreshKnobs) -> Duration {
    match expires_at {
        Some(exp) => {
            let until_fire = exp.saturating_sub(now).saturating_sub(knobs.margin_secs);
            Duration::from_secs(until_fire.max(knobs.min_delay_secs))
        }
        None => Duration::from_secs(knobs.poll_secs),
    }
}

/// Owner of the single live refresh timer handle.
pub struct RefreshTimer {
    current: Mutex<Option<CancellationToken>>,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self { current: Mutex::new(None) }
    }

    /// Cancel any pending firing and arm a new one after `delay`.
    ///
    /// Returns the new timer's token so callers (and tests) can observe
    /// cancellation.
    pub fn arm<F, Fut>(&self, delay: Duration, on_fire: F) -> CancellationToken
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut slot = self.current.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(prev) = slot.replace(token.clone()) {
                prev.cancel();
            }
        }
        let fire_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = fire_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => on_fire().await,
            }
        });
        token
    }

    /// Cancel the pending firing, if any. Mandatory on teardown so no
    /// callback fires against a destroyed session.
    pub fn cancel(&self) {
        let mut slot = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = slot.take() {
            token.cancel();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }
}

impl Default for RefreshTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Arm the next firing from the token's expiry claim.
pub(crate) fn schedule(inner: &Arc<Inner>, expires_at: Option<u64>) {
    let delay = compute_delay(epoch_secs(), expires_at, &inner.knobs);
    tracing::debug!(delay_secs = delay.as_secs(), "refresh scheduled");
    let tick_inner = Arc::clone(inner);
    inner.timer.arm(delay, move || async move {
        tick(tick_inner, expires_at).await;
    });
}

/// One firing of the proactive timer.
pub(crate) async fn tick(inner: Arc<Inner>, expires_at: Option<u64>) {
    if let Some(exp) = expires_at {
        let remaining = exp.saturating_sub(epoch_secs());
        if remaining > inner.knobs.min_validity_secs {
            // Still comfortably valid; nothing to refresh, nothing for the
            // sink. Reschedule against the unchanged expiry.
            tracing::debug!(remaining_secs = remaining, "token still valid, rescheduling");
            schedule(&inner, expires_at);
            return;
        }
    }
    refresh_now(&inner, FailureKind::Refresh).await;
}

/// One refresh attempt. On success the sink and store are updated and the
/// next firing is armed; on failure the episode escalates to a forced
/// interactive login, at most once.
pub(crate) async fn refresh_now(inner: &Arc<Inner>, kind: FailureKind) {
    let refresh_token = persist::load(&persist::session_path(&inner.state_dir))
        .map(|p| p.refresh_token)
        .unwrap_or_default();
    let Some(refresh_token) = refresh_token else {
        force_reauth(inner, kind, "no refresh token available").await;
        return;
    };

    match inner.broker.refresh(&refresh_token).await {
        Ok(token) => {
            let unchanged = inner.store.snapshot().access_token.as_deref()
                == Some(token.access_token.as_str());
            if unchanged {
                // Broker handed back the token we already hold; the sink
                // must not be disturbed.
                let current_exp = inner.store.snapshot().claims.and_then(|c| c.expires_at);
                schedule(inner, current_exp);
                return;
            }
            if let Err(e) = handshake::adopt_tokens(inner, token, SessionEvent::Refreshed).await {
                force_reauth(inner, FailureKind::TokenDecode, &e.to_string()).await;
            } else {
                tracing::info!("access token refreshed");
            }
        }
        Err(e) => force_reauth(inner, kind, &e.to_string()).await,
    }
}

/// Escalate a failed refresh to an interactive login.
///
/// Gated: the proactive timer and the backstop expiry callback can both
/// observe the same failure, but only one redirect may be triggered.
pub(crate) async fn force_reauth(inner: &Arc<Inner>, kind: FailureKind, error: &str) {
    if !inner.reauth.begin() {
        tracing::debug!("re-login already in flight, skipping duplicate trigger");
        return;
    }
    tracing::warn!(?kind, error, "refresh failed, forcing interactive login");
    inner.store.emit(SessionEvent::Failed { kind, error: error.to_owned() });

    // Never leave a stale token attached to outbound requests.
    inner.sink.clear_token();
    inner.timer.cancel();
    inner.store.set_unauthenticated();

    if let Err(e) = handshake::begin_login(inner) {
        tracing::warn!(err = %e, "could not start interactive login");
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
