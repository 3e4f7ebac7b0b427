// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;

#[test]
fn init_guard_grants_once() {
    let guard = InitGuard::new();
    assert!(guard.acquire());
    assert!(!guard.acquire());
    assert!(!guard.acquire());
}

#[test]
fn init_guard_grants_once_across_threads() {
    let guard = Arc::new(InitGuard::new());
    let mut handles = Vec::new();
    for _ in 0..16 {
        let g = Arc::clone(&guard);
        handles.push(std::thread::spawn(move || g.acquire()));
    }
    let granted = handles.into_iter().map(|h| h.join()).filter(|r| matches!(r, Ok(true))).count();
    assert_eq!(granted, 1);
}

#[test]
fn reauth_guard_admits_one_per_episode() {
    let guard = ReauthGuard::new();
    assert!(guard.begin());
    assert!(!guard.begin());

    // A successful reauthentication closes the episode.
    guard.reset();
    assert!(guard.begin());
    assert!(!guard.begin());
}
