// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token sink boundary: where fresh credentials get pushed.

use std::sync::RwLock;

/// Receives the current access token on every (re)authentication and a
/// clear signal on logout.
///
/// Implementations attach the token to outbound requests. An HTTP 401
/// from the API side means "credential rejected" and is the sink's
/// consumers' problem to report; the sink never initiates
/// re-authentication itself.
pub trait TokenSink: Send + Sync {
    fn set_token(&self, token: &str);
    fn clear_token(&self);
}

/// Reqwest-backed sink holding the current bearer token for outbound calls.
#[derive(Default)]
pub struct BearerSink {
    token: RwLock<Option<String>>,
}

impl BearerSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the current token, if any, to an outbound request.
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.current() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub fn current(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.as_ref().cloned())
    }
}

impl TokenSink for BearerSink {
    fn set_token(&self, token: &str) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.to_owned());
        }
    }

    fn clear_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}
