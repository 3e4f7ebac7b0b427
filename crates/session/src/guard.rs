// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural latches for exactly-once and at-most-once operations.

use std::sync::atomic::{AtomicBool, Ordering};

/// Latch granting exactly one acquisition per process lifetime.
///
/// The surface that owns the handshake may be constructed more than once
/// during startup (fast remounts, dev-harness double invocation). Starting
/// two handshakes would double-consume a one-time authorization code and
/// corrupt both flows, so the start operation is gated here instead of
/// with ad hoc checks at call sites.
#[derive(Debug, Default)]
pub struct InitGuard {
    taken: AtomicBool,
}

impl InitGuard {
    pub fn new() -> Self {
        Self { taken: AtomicBool::new(false) }
    }

    /// Returns true exactly once; every later call returns false.
    pub fn acquire(&self) -> bool {
        !self.taken.swap(true, Ordering::SeqCst)
    }
}

/// Makes the forced redirect-to-login at-most-once per failure episode.
///
/// Two independent failure sources (the proactive refresh timer and the
/// broker's expired-token callback) can observe the same failure around
/// the same time; only the first may trigger the redirect.
#[derive(Debug, Default)]
pub struct ReauthGuard {
    in_flight: AtomicBool,
}

impl ReauthGuard {
    pub fn new() -> Self {
        Self { in_flight: AtomicBool::new(false) }
    }

    /// Returns true for the first caller of an episode.
    pub fn begin(&self) -> bool {
        !self.in_flight.swap(true, Ordering::SeqCst)
    }

    /// Close the episode after a successful (re)authentication.
    pub fn reset(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
