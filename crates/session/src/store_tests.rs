// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn starts_loading_and_unauthenticated() {
    let store = SessionStore::new();
    let s = store.snapshot();
    assert!(s.loading);
    assert!(!s.authenticated);
    assert!(s.access_token.is_none());
    assert!(s.claims.is_none());
}

#[test]
fn capability_checks_are_false_without_identity() {
    let store = SessionStore::new();
    assert!(!store.has_role("editor"));
    assert!(!store.has_realm_role("auditor"));
}

#[test]
fn set_authenticated_replaces_claims_wholesale() {
    let store = SessionStore::new();
    let first = IdentityClaims {
        resource_roles: vec!["editor".into()],
        ..Default::default()
    };
    store.set_authenticated("tok-1".into(), first);
    assert!(store.has_role("editor"));

    // A refresh carries new claims; the old grant must not survive.
    let second = IdentityClaims {
        realm_roles: vec!["auditor".into()],
        ..Default::default()
    };
    store.set_authenticated("tok-2".into(), second);
    assert!(!store.has_role("editor"));
    assert!(store.has_role("auditor"));
    assert!(store.has_realm_role("auditor"));
    assert_eq!(store.snapshot().access_token.as_deref(), Some("tok-2"));
}

#[test]
fn set_unauthenticated_clears_everything() {
    let store = SessionStore::new();
    store.set_authenticated("tok".into(), IdentityClaims::default());
    store.set_unauthenticated();
    let s = store.snapshot();
    assert!(!s.authenticated);
    assert!(!s.loading);
    assert!(s.access_token.is_none());
    assert!(s.claims.is_none());
}

#[tokio::test]
async fn watch_observes_transitions() {
    let store = SessionStore::new();
    let mut rx = store.watch();
    assert!(rx.borrow().loading);

    store.set_authenticated("tok".into(), IdentityClaims::default());
    rx.changed().await.ok();
    assert!(rx.borrow().authenticated);
}

#[tokio::test]
async fn events_reach_subscribers() {
    let store = SessionStore::new();
    let mut rx = store.subscribe();
    store.emit(SessionEvent::LoginRequired { auth_url: "https://id/auth".into() });
    let event = rx.recv().await.ok();
    assert!(matches!(
        event,
        Some(SessionEvent::LoginRequired { auth_url }) if auth_url == "https://id/auth"
    ));
}
