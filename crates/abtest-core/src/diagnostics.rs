//! Failure-rate damped diagnostics for the read API.
//!
//! Under a sustained failure every lookup fails the same way; logging each
//! one would flood the sink. The tracker counts failures and only emits a
//! line when the running count is a power of two, so volume grows with the
//! logarithm of the failure count.

use abtest_types::AbError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Where a tracked failure came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackContext<'a> {
    pub subject_id: &'a str,
    pub exp_name: &'a str,
    pub key_name: &'a str,
}

#[derive(Debug, Default)]
pub struct ErrorTracker {
    count: AtomicU64,
}

impl ErrorTracker {
    pub const fn new() -> Self {
        Self { count: AtomicU64::new(0) }
    }

    /// Count `error` raised by `operation`; returns true if a line was logged.
    ///
    /// `ExperimentNotMatch` is steady-state behavior and is neither counted
    /// nor logged.
    pub fn track(&self, operation: &str, ctx: TrackContext<'_>, error: &AbError) -> bool {
        if error.is_expected() {
            return false;
        }

        let count = self.count.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if !count.is_power_of_two() {
            return false;
        }

        tracing::warn!(
            operation,
            subject_id = ctx.subject_id,
            exp_name = ctx.exp_name,
            key_name = ctx.key_name,
            failures = count,
            error = %error,
            "A/B lookup failed"
        );
        true
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Restart the damping sequence, e.g. after fresh data arrived.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
