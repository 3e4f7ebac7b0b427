// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide session state: a snapshot channel plus an event broadcast.
//!
//! The store has a defined writer set — the handshake executor, the
//! refresh scheduler, and the logout path. Everything else subscribes.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::claims::IdentityClaims;
use crate::error::FailureKind;

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    pub authenticated: bool,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<IdentityClaims>,
}

/// Events emitted by the session lifecycle controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The initial handshake completed.
    Authenticated,
    /// The access token was refreshed ahead of expiry.
    Refreshed,
    /// Interactive login is required; the host should navigate to `auth_url`.
    LoginRequired { auth_url: String },
    /// The session ended; the host should navigate to `logout_url`.
    LoggedOut {
        #[serde(skip_serializing_if = "Option::is_none")]
        logout_url: Option<String>,
    },
    /// A lifecycle operation failed.
    Failed { kind: FailureKind, error: String },
}

/// Owner of the session snapshot and the event fan-out.
pub struct SessionStore {
    snapshot_tx: watch::Sender<Session>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// A new store starts loading and unauthenticated.
    pub fn new() -> Self {
        let initial = Session { loading: true, ..Default::default() };
        let (snapshot_tx, _) = watch::channel(initial);
        let (event_tx, _) = broadcast::channel(64);
        Self { snapshot_tx, event_tx }
    }

    pub fn snapshot(&self) -> Session {
        self.snapshot_tx.borrow().clone()
    }

    /// Reactive view of the snapshot.
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Replace token and claims wholesale after a successful exchange or
    /// refresh.
    pub fn set_authenticated(&self, access_token: String, claims: IdentityClaims) {
        self.snapshot_tx.send_replace(Session {
            authenticated: true,
            loading: false,
            access_token: Some(access_token),
            claims: Some(claims),
        });
    }

    /// Drop to the unauthenticated holding state with loading resolved.
    pub fn set_unauthenticated(&self) {
        self.snapshot_tx.send_replace(Session {
            authenticated: false,
            loading: false,
            access_token: None,
            claims: None,
        });
    }

    /// Capability check over the latest claims; false without an identity.
    pub fn has_role(&self, role: &str) -> bool {
        self.snapshot_tx.borrow().claims.as_ref().is_some_and(|c| c.has_role(role))
    }

    /// Realm-scoped capability check; false without an identity.
    pub fn has_realm_role(&self, role: &str) -> bool {
        self.snapshot_tx.borrow().claims.as_ref().is_some_and(|c| c.has_realm_role(role))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
