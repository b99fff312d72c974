// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast event fan-out with circuit-breaker rate limiting (spec §4.4).

use crate::circuit::CircuitBreaker;
use jobkit_core::clock::{Clock, SystemClock};
use jobkit_core::event::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type Subscriber = Arc<dyn Fn(&Event) + Send + Sync>;

struct Inner<C: Clock> {
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_subscriber_id: AtomicU64,
    disposed: AtomicBool,
    circuit: CircuitBreaker<C>,
}

/// Multi-producer multi-consumer broadcast channel of [`Event`]s.
///
/// A single producer's emissions are delivered to all live subscribers in
/// the order they were emitted. Scoped instances (construct more than one
/// `SignalBus`) are fully independent and never cross-deliver.
#[derive(Clone)]
pub struct SignalBus<C: Clock = SystemClock>(Arc<Inner<C>>);

impl SignalBus<SystemClock> {
    pub fn new(default_limit_per_second: u32, type_limits: HashMap<&'static str, u32>) -> Self {
        Self::with_clock(SystemClock, default_limit_per_second, type_limits)
    }
}

impl<C: Clock> SignalBus<C> {
    pub fn with_clock(
        clock: C,
        default_limit_per_second: u32,
        type_limits: HashMap<&'static str, u32>,
    ) -> Self {
        Self(Arc::new(Inner {
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
            circuit: CircuitBreaker::new(clock, default_limit_per_second, type_limits),
        }))
    }

    /// Register a subscriber; returns an unregister closure (the same
    /// shape as `CancellationToken::on_cancel`'s subscription handle).
    pub fn listen(&self, callback: impl Fn(&Event) + Send + Sync + 'static) -> impl FnOnce() {
        let id = self.0.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        self.0.subscribers.lock().push((id, Arc::new(callback)));
        let inner = self.0.clone();
        move || {
            inner.subscribers.lock().retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Deliver `event` to all current subscribers in emission order.
    /// Returns `false` if the bus is disposed or the per-type circuit has
    /// tripped for this window — in both cases the event is dropped, never
    /// queued.
    pub fn emit(&self, event: Event) -> bool {
        if self.0.disposed.load(Ordering::SeqCst) {
            return false;
        }

        let event_type = event.type_name();
        let (allowed, should_warn) = self.0.circuit.allow(event_type);
        if !allowed {
            if should_warn {
                tracing::warn!(event_type, "circuit tripped, dropping events for this window");
            }
            return false;
        }

        // Copy subscribers out before invoking: a subscriber that
        // registers or unregisters another subscriber mid-delivery cannot
        // deadlock or skip callbacks. Same convention as
        // `CancellationToken::cancel`.
        let subscribers: Vec<(u64, Subscriber)> = self.0.subscribers.lock().clone();
        for (_, subscriber) in &subscribers {
            let _ = std::panic::catch_unwind(AssertUnwindSafe(|| subscriber(&event)));
        }
        true
    }

    /// Close the bus. Further `emit` calls are no-ops; existing
    /// subscribers are dropped.
    pub fn dispose(&self) {
        self.0.disposed.store(true, Ordering::SeqCst);
        self.0.subscribers.lock().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.lock().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
