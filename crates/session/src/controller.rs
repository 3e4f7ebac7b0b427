// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session lifecycle controller: the single owner and writer of
//! authentication state for the process.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::broker::BrokerClient;
use crate::config::BrokerConfig;
use crate::error::FailureKind;
use crate::guard::{InitGuard, ReauthGuard};
use crate::handshake;
use crate::persist::{self, PersistedSession};
use crate::pkce;
use crate::refresh::{self, RefreshKnobs, RefreshTimer};
use crate::sink::{BearerSink, TokenSink};
use crate::store::{Session, SessionEvent, SessionStore};

/// Shared state behind the controller handle.
pub(crate) struct Inner {
    pub(crate) config: BrokerConfig,
    pub(crate) broker: BrokerClient,
    pub(crate) store: SessionStore,
    pub(crate) sink: Arc<dyn TokenSink>,
    pub(crate) init: InitGuard,
    pub(crate) reauth: ReauthGuard,
    pub(crate) timer: RefreshTimer,
    pub(crate) knobs: RefreshKnobs,
    pub(crate) state_dir: PathBuf,
}

/// Cheaply cloneable handle to the session lifecycle controller.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(config: BrokerConfig) -> Self {
        Self::with_sink(config, Arc::new(BearerSink::new()))
    }

    /// Construct with an explicit token sink (the outbound API layer).
    pub fn with_sink(config: BrokerConfig, sink: Arc<dyn TokenSink>) -> Self {
        let state_dir = persist::state_dir(config.state_dir.as_deref());
        let broker = BrokerClient::new(config.token_endpoint(), config.client_id.clone());
        let knobs = RefreshKnobs::from_config(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                broker,
                store: SessionStore::new(),
                sink,
                init: InitGuard::new(),
                reauth: ReauthGuard::new(),
                timer: RefreshTimer::new(),
                knobs,
                state_dir,
            }),
        }
    }

    /// Start the handshake with the broker.
    ///
    /// Exactly one call per process does anything; duplicates (fast
    /// remounts, double construction of the owning surface) return
    /// immediately without a second broker exchange.
    pub async fn initialize(&self) {
        if !self.inner.init.acquire() {
            tracing::debug!("initialize called again, handshake already started");
            return;
        }
        handshake::initialize(&self.inner).await;
    }

    /// Request an interactive login; returns the authorization URL the
    /// host must navigate to.
    pub fn login(&self) -> anyhow::Result<String> {
        handshake::begin_login(&self.inner)
    }

    /// Authorization URL for a hidden `prompt=none` session check.
    pub fn silent_login_url(&self) -> anyhow::Result<String> {
        handshake::begin_silent_login(&self.inner)
    }

    /// Finish a login from the broker's redirect callback.
    pub async fn complete_login(&self, code: &str, state: &str) -> anyhow::Result<()> {
        match handshake::complete_login(&self.inner, code, state).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Hold unauthenticated rather than crash; the raw protocol
                // error goes to the event channel, not the user.
                self.inner.store.set_unauthenticated();
                self.inner.store.emit(SessionEvent::Failed {
                    kind: FailureKind::Handshake,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Backstop for the broker's own expired-token signal: a one-shot
    /// refresh attempt independent of the proactive timer. Shares the
    /// re-login guard with the timer path.
    pub async fn on_token_expired(&self) {
        if !self.inner.store.snapshot().authenticated {
            return;
        }
        refresh::refresh_now(&self.inner, FailureKind::Refresh).await;
    }

    /// End the session: clear the sink credential, the login-attempt
    /// marker, and persisted tokens; cancel the refresh timer. Returns the
    /// broker logout URL the host should navigate to.
    pub fn logout(&self) -> String {
        let inner = &self.inner;
        inner.timer.cancel();
        inner.sink.clear_token();
        persist::clear_marker(&inner.state_dir);

        let path = persist::session_path(&inner.state_dir);
        if let Err(e) = persist::save(&path, &PersistedSession::default()) {
            tracing::warn!(err = %e, "failed to clear persisted session");
        }

        inner.store.set_unauthenticated();
        let logout_url = self.logout_url();
        inner.store.emit(SessionEvent::LoggedOut { logout_url: Some(logout_url.clone()) });
        tracing::info!("session ended");
        logout_url
    }

    fn logout_url(&self) -> String {
        let config = &self.inner.config;
        let mut url = format!(
            "{}?client_id={}",
            config.logout_endpoint(),
            pkce::percent_encode(&config.client_id),
        );
        if let Some(target) = &config.post_logout_redirect_uri {
            url.push_str("&post_logout_redirect_uri=");
            url.push_str(&pkce::percent_encode(target));
        }
        url
    }

    pub fn snapshot(&self) -> Session {
        self.inner.store.snapshot()
    }

    /// Reactive view of the session snapshot.
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.inner.store.watch()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.store.subscribe()
    }

    /// True if `role` is granted resource-scoped or realm-scoped.
    pub fn has_role(&self, role: &str) -> bool {
        self.inner.store.has_role(role)
    }

    /// True only for realm-scoped grants.
    pub fn has_realm_role(&self, role: &str) -> bool {
        self.inner.store.has_realm_role(role)
    }

    /// Whether a refresh firing is currently pending.
    pub fn refresh_armed(&self) -> bool {
        self.inner.timer.is_armed()
    }

    /// Teardown: no refresh callback may fire past this point.
    pub fn shutdown(&self) {
        self.inner.timer.cancel();
    }

    pub(crate) fn inner(&self) -> &Arc<Inner> {
        &self.inner
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
