// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity claims projection and capability evaluation.
//!
//! The broker's claim blob is dynamic; only the named fields below are
//! projected out, and capability checks never see the raw payload.

use std::collections::HashMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Role list as it appears inside `realm_access` / `resource_access`.
#[derive(Debug, Clone, Default, Deserialize)]
struct RoleSet {
    #[serde(default)]
    roles: Vec<String>,
}

/// Raw payload shape of a broker-issued token.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    exp: Option<u64>,
    email: Option<String>,
    name: Option<String>,
    preferred_username: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    #[serde(default)]
    realm_access: Option<RoleSet>,
    #[serde(default)]
    resource_access: Option<HashMap<String, RoleSet>>,
}

/// Read-only projection of the identity carried by the current access
/// token. Replaced wholesale on every successful refresh, never mutated
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// `exp` claim, epoch seconds. Missing or unparseable expiry is `None`
    /// and degrades the refresh scheduler to fixed polling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Roles granted across the whole realm.
    pub realm_roles: Vec<String>,
    /// Roles granted for this application's client registration only.
    pub resource_roles: Vec<String>,
}

impl IdentityClaims {
    /// Decode the payload segment of a JWT-shaped token.
    ///
    /// No signature verification happens here: this side consumes the
    /// token, it does not grant authority from it. Resource servers
    /// verify signatures on their own.
    pub fn decode(token: &str, client_id: &str) -> anyhow::Result<Self> {
        let payload =
            token.split('.').nth(1).ok_or_else(|| anyhow::anyhow!("token is not JWT-shaped"))?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        let mut raw: RawClaims = serde_json::from_slice(&bytes)?;

        let realm_roles = raw.realm_access.take().map(|r| r.roles).unwrap_or_default();
        let resource_roles = raw
            .resource_access
            .take()
            .and_then(|mut m| m.remove(client_id))
            .map(|r| r.roles)
            .unwrap_or_default();

        Ok(Self {
            subject: raw.sub,
            email: raw.email,
            name: raw.name,
            username: raw.preferred_username,
            given_name: raw.given_name,
            family_name: raw.family_name,
            expires_at: raw.exp,
            realm_roles,
            resource_roles,
        })
    }

    /// True if `role` is granted either for this client or realm-wide.
    /// The two grant sets are combined as a union, never an intersection.
    pub fn has_role(&self, role: &str) -> bool {
        self.resource_roles.iter().any(|r| r == role) || self.has_realm_role(role)
    }

    /// True only for realm-wide grants.
    pub fn has_realm_role(&self, role: &str) -> bool {
        self.realm_roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
