// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry eligibility and backoff computation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Computes retry eligibility and backoff delays for a failing job.
///
/// `delay(attempt) = base_delay` when `exponential` is false; otherwise
/// `min(base_delay * 2^attempt, max_delay)`. `attempt` is zero-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: base_delay.saturating_mul(1 << 10.min(30)),
            exponential: false,
        }
    }

    pub fn exponential(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self { max_retries, base_delay, max_delay, exponential: true }
    }

    crate::setters! {
        set { max_retries: u32, base_delay: Duration, max_delay: Duration, exponential: bool }
    }

    /// Whether another attempt is permitted after a failure at `attempt`
    /// (zero-indexed). `should_retry` lets the caller veto retrying a
    /// particular error class; absent that, retry is allowed up to
    /// `max_retries`.
    pub fn can_retry(&self, attempt: u32, should_retry: impl FnOnce() -> bool) -> bool {
        attempt < self.max_retries && should_retry()
    }

    /// Backoff delay before the attempt numbered `attempt + 1`.
    pub fn delay(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.base_delay;
        }
        let shift = attempt.min(30);
        let scaled = self.base_delay.saturating_mul(1u32 << shift);
        scaled.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, Duration::from_millis(0))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
