// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the session agent and its identity broker.
#[derive(Debug, Clone, clap::Args)]
pub struct BrokerConfig {
    /// Host to bind the local agent on.
    #[arg(long, default_value = "127.0.0.1", env = "ANTEROOM_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9840, env = "ANTEROOM_PORT")]
    pub port: u16,

    /// Identity broker base URL, e.g. `https://id.example.com`.
    #[arg(long, env = "ANTEROOM_BROKER_URL")]
    pub broker_url: String,

    /// Realm (tenant) identifier at the broker.
    #[arg(long, env = "ANTEROOM_REALM")]
    pub realm: String,

    /// Client identifier registered for this application.
    #[arg(long, env = "ANTEROOM_CLIENT_ID")]
    pub client_id: String,

    /// Redirect URI for the interactive login callback.
    /// Defaults to the agent's own `/callback` endpoint.
    #[arg(long, env = "ANTEROOM_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Redirect URI for the silent session check.
    /// Defaults to the agent's own `/silent-check` endpoint.
    #[arg(long, env = "ANTEROOM_SILENT_CHECK_URI")]
    pub silent_check_uri: Option<String>,

    /// Where the broker sends the user after logout.
    #[arg(long, env = "ANTEROOM_POST_LOGOUT_REDIRECT_URI")]
    pub post_logout_redirect_uri: Option<String>,

    /// Scopes requested at login.
    #[arg(long, default_value = "openid profile email", env = "ANTEROOM_SCOPES")]
    pub scopes: String,

    /// Seconds before expiry at which a refresh fires.
    #[arg(long, default_value_t = 60, env = "ANTEROOM_REFRESH_MARGIN_SECS")]
    pub refresh_margin_secs: u64,

    /// Floor on the scheduled refresh delay (guards against clock skew
    /// and near-expiry tokens causing a refresh storm).
    #[arg(long, default_value_t = 30, env = "ANTEROOM_MIN_REFRESH_DELAY_SECS")]
    pub min_refresh_delay_secs: u64,

    /// Poll interval when the token carries no parseable expiry.
    #[arg(long, default_value_t = 60, env = "ANTEROOM_FALLBACK_POLL_SECS")]
    pub fallback_poll_secs: u64,

    /// Remaining validity below which a firing refresh actually refreshes;
    /// above it the firing is a no-op and reschedules.
    #[arg(long, default_value_t = 60, env = "ANTEROOM_MIN_VALIDITY_SECS")]
    pub min_validity_secs: u64,

    /// Override the state directory for persisted session data.
    #[arg(long, env = "ANTEROOM_STATE_DIR")]
    pub state_dir: Option<std::path::PathBuf>,
}

impl BrokerConfig {
    fn realm_base(&self) -> String {
        format!("{}/realms/{}", self.broker_url.trim_end_matches('/'), self.realm)
    }

    pub fn auth_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/auth", self.realm_base())
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/token", self.realm_base())
    }

    pub fn logout_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/logout", self.realm_base())
    }

    /// Base URL of the local agent itself.
    pub fn local_base(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn login_redirect_uri(&self) -> String {
        self.redirect_uri.clone().unwrap_or_else(|| format!("{}/callback", self.local_base()))
    }

    pub fn silent_redirect_uri(&self) -> String {
        self.silent_check_uri
            .clone()
            .unwrap_or_else(|| format!("{}/silent-check", self.local_base()))
    }
}
