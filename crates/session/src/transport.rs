// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local HTTP surface: broker redirect callbacks and the session API.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::controller::SessionController;
use crate::error::SessionError;
use crate::handshake::strip_auth_artifacts;

pub fn build_router(controller: Arc<SessionController>) -> Router {
    Router::new()
        .route("/callback", get(login_callback))
        .route("/silent-check", get(silent_check_callback))
        .route("/api/v1/session", get(session_snapshot))
        .route("/api/v1/login", post(login))
        .route("/api/v1/logout", post(logout))
        .route("/api/v1/health", get(health))
        .with_state(controller)
}

/// Query parameters the broker may attach when redirecting back.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// `GET /callback` — interactive login redirect target.
async fn login_callback(
    State(c): State<Arc<SessionController>>,
    uri: Uri,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        // The broker declined; hold unauthenticated, never crash.
        tracing::warn!(error, description = ?params.error_description, "login callback carried an error");
        return Json(c.snapshot()).into_response();
    }

    let (code, state) = match (params.code, params.state) {
        (Some(code), Some(state)) => (code, state),
        (None, None) => {
            // Bare visit (e.g. a reload after the exchange already ran).
            return Json(c.snapshot()).into_response();
        }
        _ => {
            return SessionError::BadRequest
                .to_http_response("callback requires both code and state")
                .into_response();
        }
    };

    match c.complete_login(&code, &state).await {
        Ok(()) => {
            // One-time artifacts must not survive in the location bar.
            Redirect::to(&strip_auth_artifacts(&uri.to_string())).into_response()
        }
        Err(e) => SessionError::HandshakeFailed.to_http_response(e.to_string()).into_response(),
    }
}

/// `GET /silent-check` — hidden-frame redirect target for `prompt=none`.
///
/// A `login_required` error here is not fatal: it just means no broker
/// session exists, so the flow falls through to interactive login.
async fn silent_check_callback(
    State(c): State<Arc<SessionController>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let (Some(code), Some(state)) = (&params.code, &params.state) {
        return match c.complete_login(code, state).await {
            Ok(()) => Json(c.snapshot()).into_response(),
            Err(e) => SessionError::HandshakeFailed.to_http_response(e.to_string()).into_response(),
        };
    }

    tracing::debug!(error = ?params.error, "no broker session, falling through to interactive login");
    match c.login() {
        Ok(auth_url) => {
            Json(serde_json::json!({ "login_required": true, "auth_url": auth_url }))
                .into_response()
        }
        Err(e) => SessionError::Internal.to_http_response(e.to_string()).into_response(),
    }
}

/// `GET /api/v1/session` — current snapshot for local consumers.
async fn session_snapshot(State(c): State<Arc<SessionController>>) -> Response {
    Json(c.snapshot()).into_response()
}

/// `POST /api/v1/login` — request an interactive login URL.
async fn login(State(c): State<Arc<SessionController>>) -> Response {
    match c.login() {
        Ok(auth_url) => Json(serde_json::json!({ "auth_url": auth_url })).into_response(),
        Err(e) => SessionError::Internal.to_http_response(e.to_string()).into_response(),
    }
}

/// `POST /api/v1/logout` — end the session.
async fn logout(State(c): State<Arc<SessionController>>) -> Response {
    let logout_url = c.logout();
    Json(serde_json::json!({ "logout_url": logout_url })).into_response()
}

/// `GET /api/v1/health`.
async fn health(State(c): State<Arc<SessionController>>) -> Response {
    let snapshot = c.snapshot();
    Json(serde_json::json!({
        "status": "running",
        "authenticated": snapshot.authenticated,
        "loading": snapshot.loading,
    }))
    .into_response()
}
