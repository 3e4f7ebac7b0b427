// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn code_verifier_is_valid_length() {
    let v = generate_code_verifier();
    assert!(v.len() >= 43 && v.len() <= 128, "verifier length {} out of range", v.len());
}

#[test]
fn code_challenge_matches_rfc7636_vector() {
    // Appendix B of RFC 7636.
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(compute_code_challenge(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn state_is_unique() {
    assert_ne!(generate_state(), generate_state());
}

#[test]
fn auth_url_includes_pkce_params() {
    let url = build_auth_url(
        "https://id.example.com/realms/acme/protocol/openid-connect/auth",
        "inventory-ui",
        "http://127.0.0.1:9840/callback",
        "openid profile email",
        "challenge-abc",
        "state-xyz",
        None,
    );
    assert!(url.starts_with("https://id.example.com/realms/acme/protocol/openid-connect/auth?"));
    assert!(url.contains("client_id=inventory-ui"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A9840%2Fcallback"));
    assert!(url.contains("scope=openid%20profile%20email"));
    assert!(url.contains("code_challenge=challenge-abc"));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(url.contains("state=state-xyz"));
    assert!(!url.contains("prompt="));
}

#[test]
fn silent_variant_appends_prompt_none() {
    let url = build_auth_url(
        "https://id.example.com/realms/acme/protocol/openid-connect/auth",
        "inventory-ui",
        "http://127.0.0.1:9840/silent-check",
        "openid",
        "c",
        "s",
        Some("none"),
    );
    assert!(url.ends_with("&prompt=none"));
}
