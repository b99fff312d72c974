// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event-type token window backing the bus's circuit breaker.

use jobkit_core::clock::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;

const WINDOW_MS: u64 = 1000;

struct Window {
    started_at_epoch_ms: u64,
    count: u32,
    warned: bool,
}

/// Tracks a sliding 1-second token count per event type, capped at a
/// per-type limit (falling back to a default). Not a real token bucket —
/// the window resets wholesale once it elapses, matching the spec's
/// "sliding 1-second window" description at the granularity it actually
/// needs (drop-and-warn, not smooth rate shaping).
pub struct CircuitBreaker<C: Clock> {
    clock: C,
    default_limit: u32,
    overrides: HashMap<&'static str, u32>,
    windows: Mutex<HashMap<&'static str, Window>>,
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn new(clock: C, default_limit: u32, overrides: HashMap<&'static str, u32>) -> Self {
        Self { clock, default_limit, overrides, windows: Mutex::new(HashMap::new()) }
    }

    fn limit_for(&self, event_type: &'static str) -> u32 {
        self.overrides.get(event_type).copied().unwrap_or(self.default_limit)
    }

    /// Returns `(allowed, should_warn)`. `should_warn` is true at most once
    /// per tripped window, so callers can log "once per window" as the
    /// spec requires without tracking that themselves.
    pub fn allow(&self, event_type: &'static str) -> (bool, bool) {
        let now = self.clock.epoch_ms();
        let limit = self.limit_for(event_type);
        let mut windows = self.windows.lock();
        let window = windows.entry(event_type).or_insert_with(|| Window {
            started_at_epoch_ms: now,
            count: 0,
            warned: false,
        });

        if now.saturating_sub(window.started_at_epoch_ms) >= WINDOW_MS {
            window.started_at_epoch_ms = now;
            window.count = 0;
            window.warned = false;
        }

        if window.count < limit {
            window.count += 1;
            (true, false)
        } else {
            let should_warn = !window.warned;
            window.warned = true;
            (false, should_warn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobkit_core::clock::FakeClock;
    use std::time::Duration;

    #[test]
    fn allows_up_to_the_limit_then_trips() {
        let breaker = CircuitBreaker::new(FakeClock::new(), 3, HashMap::new());
        assert_eq!(breaker.allow("x"), (true, false));
        assert_eq!(breaker.allow("x"), (true, false));
        assert_eq!(breaker.allow("x"), (true, false));
        assert_eq!(breaker.allow("x"), (false, true));
        // Already warned this window; no repeat warning.
        assert_eq!(breaker.allow("x"), (false, false));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let clock = FakeClock::new();
        let breaker = CircuitBreaker::new(clock.clone(), 1, HashMap::new());
        assert_eq!(breaker.allow("x"), (true, false));
        assert_eq!(breaker.allow("x"), (false, true));
        clock.advance(Duration::from_millis(1001));
        assert_eq!(breaker.allow("x"), (true, false));
    }

    #[test]
    fn per_type_override_applies_independently() {
        let breaker =
            CircuitBreaker::new(FakeClock::new(), 1, HashMap::from([("progress", 5)]));
        for _ in 0..5 {
            assert_eq!(breaker.allow("progress").0, true);
        }
        assert_eq!(breaker.allow("progress").0, false);
        // Default limit still applies to other types.
        assert_eq!(breaker.allow("job:started").0, true);
        assert_eq!(breaker.allow("job:started").0, false);
    }
}
