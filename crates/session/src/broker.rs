// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the identity broker's token endpoint.

use std::time::Duration;

use serde::Deserialize;

/// Token set returned by the broker.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
}

/// Client for one realm's token endpoint.
///
/// Relies on the underlying client's timeout; a broker-side timeout
/// surfaces as an ordinary rejection on the caller's failure path.
pub struct BrokerClient {
    token_url: String,
    client_id: String,
    http: reqwest::Client,
}

impl BrokerClient {
    pub fn new(token_url: String, client_id: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { token_url, client_id, http }
    }

    /// Exchange an authorization code for a token set (PKCE).
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> anyhow::Result<TokenResponse> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("code_verifier", code_verifier),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;
        parse_token_response(resp, "token exchange").await
    }

    /// Trade a refresh token for a fresh token set.
    pub async fn refresh(&self, refresh_token: &str) -> anyhow::Result<TokenResponse> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;
        parse_token_response(resp, "refresh").await
    }
}

async fn parse_token_response(
    resp: reqwest::Response,
    op: &str,
) -> anyhow::Result<TokenResponse> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("{op} failed ({status}): {text}");
    }
    Ok(resp.json().await?)
}
