// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anteroom: single-session OIDC lifecycle agent.
//!
//! Performs the authorization-code-with-PKCE handshake against an
//! identity broker, keeps the access token refreshed ahead of expiry,
//! recovers from refresh failure with a single forced re-login, and
//! exposes session state and capability checks to local consumers.

pub mod broker;
pub mod claims;
pub mod config;
pub mod controller;
pub mod error;
pub mod guard;
pub mod handshake;
pub mod persist;
pub mod pkce;
pub mod refresh;
pub mod sink;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use controller::SessionController;

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto() {
    use std::sync::Once;
    static CRYPTO_INIT: Once = Once::new();
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Run the session agent until shutdown.
pub async fn run(config: config::BrokerConfig) -> anyhow::Result<()> {
    ensure_crypto();
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let controller = Arc::new(SessionController::new(config));

    // Kick off the handshake; the init guard makes a duplicate spawn
    // harmless.
    let init = Arc::clone(&controller);
    tokio::spawn(async move {
        init.initialize().await;
    });

    let router = transport::build_router(Arc::clone(&controller));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("anteroom listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    controller.shutdown();
    Ok(())
}
