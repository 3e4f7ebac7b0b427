// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::*;

/// Build an unsigned JWT-shaped token around the given payload.
fn token_with(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

fn sample_token() -> String {
    token_with(serde_json::json!({
        "sub": "f3a1",
        "exp": 1_900_000_000u64,
        "email": "maria@example.com",
        "name": "Maria Silva",
        "preferred_username": "maria",
        "given_name": "Maria",
        "family_name": "Silva",
        "realm_access": { "roles": ["auditor"] },
        "resource_access": {
            "inventory-ui": { "roles": ["editor"] },
            "other-app": { "roles": ["owner"] }
        }
    }))
}

#[test]
fn decode_projects_named_fields() -> anyhow::Result<()> {
    let claims = IdentityClaims::decode(&sample_token(), "inventory-ui")?;
    assert_eq!(claims.subject.as_deref(), Some("f3a1"));
    assert_eq!(claims.email.as_deref(), Some("maria@example.com"));
    assert_eq!(claims.username.as_deref(), Some("maria"));
    assert_eq!(claims.given_name.as_deref(), Some("Maria"));
    assert_eq!(claims.family_name.as_deref(), Some("Silva"));
    assert_eq!(claims.expires_at, Some(1_900_000_000));
    Ok(())
}

#[test]
fn has_role_is_a_union_of_both_grant_sets() -> anyhow::Result<()> {
    let claims = IdentityClaims::decode(&sample_token(), "inventory-ui")?;
    // Resource-scoped grant.
    assert!(claims.has_role("editor"));
    // Realm-scoped grant satisfies the plain check too.
    assert!(claims.has_role("auditor"));
    assert!(!claims.has_role("owner"), "other clients' grants must not leak in");
    assert!(!claims.has_role("missing"));
    Ok(())
}

#[test]
fn has_realm_role_ignores_resource_grants() -> anyhow::Result<()> {
    let claims = IdentityClaims::decode(&sample_token(), "inventory-ui")?;
    assert!(claims.has_realm_role("auditor"));
    assert!(!claims.has_realm_role("editor"));
    Ok(())
}

#[test]
fn absent_grant_blocks_are_empty_not_errors() -> anyhow::Result<()> {
    let claims = IdentityClaims::decode(&token_with(serde_json::json!({ "sub": "x" })), "app")?;
    assert!(!claims.has_role("anything"));
    assert!(!claims.has_realm_role("anything"));
    assert_eq!(claims.expires_at, None);
    Ok(())
}

#[test]
fn default_claims_grant_nothing() {
    let claims = IdentityClaims::default();
    assert!(!claims.has_role("editor"));
    assert!(!claims.has_realm_role("auditor"));
}

#[test]
fn non_jwt_token_is_rejected() {
    assert!(IdentityClaims::decode("opaque-token", "app").is_err());
    assert!(IdentityClaims::decode("a.%%%.c", "app").is_err());
}
