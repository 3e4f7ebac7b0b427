// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};

use super::*;

const KNOBS: RefreshKnobs =
    RefreshKnobs { margin_secs: 60, min_delay_secs: 30, poll_secs: 60, min_validity_secs: 60 };

// -- Delay computation ---------------------------------------------------------

#[test]
fn far_expiry_lands_margin_before() {
    let now = 1_000_000;
    let delay = compute_delay(now, Some(now + 5000), &KNOBS);
    assert_eq!(delay, Duration::from_secs(4940));
}

#[test]
fn near_expiry_is_floored() {
    let now = 1_000_000;
    assert_eq!(compute_delay(now, Some(now + 40), &KNOBS), Duration::from_secs(30));
    // Already expired tokens hit the floor too.
    assert_eq!(compute_delay(now, Some(now - 10), &KNOBS), Duration::from_secs(30));
}

#[test]
fn delay_never_drops_below_floor() {
    let now = 1_000_000;
    for offset in [0, 30, 89, 90, 91, 600, 86_400] {
        let delay = compute_delay(now, Some(now + offset), &KNOBS);
        assert!(delay >= Duration::from_secs(30), "offset {offset} gave {delay:?}");
    }
}

#[test]
fn missing_expiry_degrades_to_polling() {
    assert_eq!(compute_delay(1_000_000, None, &KNOBS), Duration::from_secs(60));
}

// -- Timer ownership -----------------------------------------------------------

#[tokio::test]
async fn arming_cancels_the_previous_timer() {
    let timer = RefreshTimer::new();
    let first = timer.arm(Duration::from_secs(600), || async {});
    let second = timer.arm(Duration::from_secs(600), || async {});
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());
    assert!(timer.is_armed());
}

#[tokio::test]
async fn armed_timer_fires() {
    let timer = RefreshTimer::new();
    let (tx, rx) = tokio::sync::oneshot::channel();
    timer.arm(Duration::from_millis(5), move || async move {
        let _ = tx.send(());
    });
    let fired = tokio::time::timeout(Duration::from_secs(2), rx).await;
    assert!(matches!(fired, Ok(Ok(()))));
}

#[tokio::test]
async fn cancelled_timer_never_fires() {
    let timer = RefreshTimer::new();
    let fired = std::sync::Arc::new(AtomicBool::new(false));
    let flag = std::sync::Arc::clone(&fired);
    timer.arm(Duration::from_millis(30), move || async move {
        flag.store(true, Ordering::SeqCst);
    });
    timer.cancel();
    assert!(!timer.is_armed());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn orphaned_timer_never_fires_after_rearm() {
    let timer = RefreshTimer::new();
    let fired = std::sync::Arc::new(AtomicBool::new(false));
    let flag = std::sync::Arc::clone(&fired);
    timer.arm(Duration::from_millis(20), move || async move {
        flag.store(true, Ordering::SeqCst);
    });
    // Re-arming replaces the pending firing entirely.
    let replacement = timer.arm(Duration::from_secs(600), || async {});
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!fired.load(Ordering::SeqCst));
    assert!(!replacement.is_cancelled());
}
