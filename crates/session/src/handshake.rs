// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authorization handshake: silent session check, interactive login
//! fallback, and the redirect-callback exchange.

use std::sync::Arc;

use crate::broker::TokenResponse;
use crate::claims::IdentityClaims;
use crate::controller::Inner;
use crate::error::FailureKind;
use crate::persist::{self, PendingLogin};
use crate::pkce;
use crate::refresh::{self, epoch_secs};
use crate::store::SessionEvent;

/// Run the startup handshake.
///
/// Resolves fully — to an authenticated session, a login redirect, or the
/// unauthenticated holding state — before any refresh is ever scheduled.
pub(crate) async fn initialize(inner: &Arc<Inner>) {
    // Silent session check first. Failure here is not an error: storage
    // restrictions or a missing broker session both just mean "log in".
    match silent_check(inner).await {
        Ok(true) => return,
        Ok(false) => {}
        Err(e) => {
            tracing::debug!(err = %e, "silent session check failed, falling through to login");
            inner
                .store
                .emit(SessionEvent::Failed { kind: FailureKind::SilentCheck, error: e.to_string() });
        }
    }

    // A marker left by a reload that landed mid-handshake suppresses a
    // second redirect; hold unauthenticated instead of looping.
    if persist::marker_present(&inner.state_dir) {
        tracing::info!("login already attempted, holding unauthenticated");
        persist::clear_marker(&inner.state_dir);
        inner.store.set_unauthenticated();
        return;
    }

    if let Err(e) = begin_login(inner) {
        tracing::warn!(err = %e, "could not start interactive login");
        inner.store.set_unauthenticated();
        inner
            .store
            .emit(SessionEvent::Failed { kind: FailureKind::Handshake, error: e.to_string() });
    }
}

/// Detect an existing broker session without user interaction by playing
/// back the persisted refresh token. `Ok(false)` means nothing persisted.
async fn silent_check(inner: &Arc<Inner>) -> anyhow::Result<bool> {
    let Ok(persisted) = persist::load(&persist::session_path(&inner.state_dir)) else {
        return Ok(false);
    };
    let Some(refresh_token) = persisted.refresh_token else {
        return Ok(false);
    };
    let token = inner.broker.refresh(&refresh_token).await?;
    adopt_tokens(inner, token, SessionEvent::Authenticated).await?;
    tracing::info!("silent session check succeeded");
    Ok(true)
}

/// Start an interactive login: mint PKCE material, persist the pending
/// exchange keyed by `state`, and hand the authorization URL to the host.
/// Control leaves the application here; there is no retry.
pub(crate) fn begin_login(inner: &Arc<Inner>) -> anyhow::Result<String> {
    let redirect_uri = inner.config.login_redirect_uri();
    let auth_url = stash_pending(inner, &redirect_uri, None)?;
    persist::set_marker(&inner.state_dir)?;

    inner.store.set_unauthenticated();
    inner.store.emit(SessionEvent::LoginRequired { auth_url: auth_url.clone() });
    tracing::info!("interactive login required");
    Ok(auth_url)
}

/// Build a `prompt=none` authorization URL for hosts that can perform a
/// hidden navigation. The broker answers from its existing session or
/// redirects back with `error=login_required`; neither shows a prompt.
pub(crate) fn begin_silent_login(inner: &Arc<Inner>) -> anyhow::Result<String> {
    let redirect_uri = inner.config.silent_redirect_uri();
    stash_pending(inner, &redirect_uri, Some("none"))
}

/// Abandoned redirects (the user closed the tab, the broker never called
/// back) would otherwise accumulate stale verifiers on disk forever.
const MAX_PENDING_LOGINS: usize = 4;

fn stash_pending(
    inner: &Arc<Inner>,
    redirect_uri: &str,
    prompt: Option<&str>,
) -> anyhow::Result<String> {
    let code_verifier = pkce::generate_code_verifier();
    let code_challenge = pkce::compute_code_challenge(&code_verifier);
    let state = pkce::generate_state();

    let path = persist::session_path(&inner.state_dir);
    let mut persisted = persist::load(&path).unwrap_or_default();
    if persisted.pending_logins.len() >= MAX_PENDING_LOGINS {
        tracing::debug!(
            abandoned = persisted.pending_logins.len(),
            "dropping abandoned pending logins"
        );
        persisted.pending_logins.clear();
    }
    persisted.pending_logins.insert(
        state.clone(),
        PendingLogin { code_verifier, redirect_uri: redirect_uri.to_owned() },
    );
    persist::save(&path, &persisted)?;

    Ok(pkce::build_auth_url(
        &inner.config.auth_endpoint(),
        &inner.config.client_id,
        redirect_uri,
        &inner.config.scopes,
        &code_challenge,
        &state,
        prompt,
    ))
}

/// Finish a login from the redirect callback: consume the pending exchange
/// for `state` and trade the one-time code for tokens.
pub(crate) async fn complete_login(inner: &Arc<Inner>, code: &str, state: &str) -> anyhow::Result<()> {
    let path = persist::session_path(&inner.state_dir);
    let mut persisted = persist::load(&path).unwrap_or_default();
    let pending = persisted
        .pending_logins
        .remove(state)
        .ok_or_else(|| anyhow::anyhow!("unknown or expired login state"))?;
    persist::save(&path, &persisted)?;

    let token =
        inner.broker.exchange_code(code, &pending.code_verifier, &pending.redirect_uri).await?;
    persist::clear_marker(&inner.state_dir);
    adopt_tokens(inner, token, SessionEvent::Authenticated).await
}

/// Install a fresh token set: claims, sink, store, persistence, and the
/// next refresh firing, in that order.
pub(crate) async fn adopt_tokens(
    inner: &Arc<Inner>,
    token: TokenResponse,
    event: SessionEvent,
) -> anyhow::Result<()> {
    let claims = IdentityClaims::decode(&token.access_token, &inner.config.client_id)?;
    let expires_at =
        claims.expires_at.or_else(|| (token.expires_in > 0).then(|| epoch_secs() + token.expires_in));

    if inner.store.snapshot().access_token.as_deref() != Some(token.access_token.as_str()) {
        inner.sink.set_token(&token.access_token);
    }
    inner.store.set_authenticated(token.access_token.clone(), claims);
    inner.reauth.reset();

    // Persist for the next silent check.
    let path = persist::session_path(&inner.state_dir);
    let mut persisted = persist::load(&path).unwrap_or_default();
    persisted.access_token = Some(token.access_token);
    if token.refresh_token.is_some() {
        persisted.refresh_token = token.refresh_token;
    }
    persisted.expires_at = expires_at.unwrap_or(0);
    persist::save(&path, &persisted)?;

    refresh::schedule(inner, expires_at);
    inner.store.emit(event);
    Ok(())
}

/// Remove one-time authorization artifacts from a URL so a reload cannot
/// replay a consumed code. The controller is the sole owner of this step.
pub fn strip_auth_artifacts(url: &str) -> String {
    const ARTIFACTS: &[&str] = &["code", "state", "session_state", "iss"];

    fn keep(params: &str) -> String {
        params
            .split('&')
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or("");
                !ARTIFACTS.contains(&key)
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    let (rest, fragment) = match url.split_once('#') {
        Some((r, f)) => (r, Some(f)),
        None => (url, None),
    };
    let (base, query) = match rest.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (rest, None),
    };

    let mut out = base.to_owned();
    if let Some(q) = query {
        let kept = keep(q);
        if !kept.is_empty() {
            out.push('?');
            out.push_str(&kept);
        }
    }
    if let Some(f) = fragment {
        let kept = keep(f);
        if !kept.is_empty() {
            out.push('#');
            out.push_str(&kept);
        }
    }
    out
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
