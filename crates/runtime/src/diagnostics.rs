// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DiagnosticsView`: a read-only snapshot over the dispatcher registry,
//! the offline queue, and a bounded ring buffer of recent bus events
//! (`SPEC_FULL.md` §2, "Diagnostics surface"). Never mutates anything it
//! observes — it exists purely so a host can inspect what the framework
//! is doing.

use jobkit_bus::SignalBus;
use jobkit_core::event::Event;
use jobkit_core::ids::JobId;
use jobkit_dispatch::DispatcherRegistry;
use jobkit_storage::queue::{NetworkQueueStorage, OfflineQueueEntry};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A bus event reduced to the fields worth inspecting after the fact —
/// domain payloads are dropped rather than cloned, since most aren't
/// `Clone` and diagnostics only needs to answer "what happened, when".
#[derive(Debug, Clone)]
pub struct RecentEvent {
    pub correlation_id: JobId,
    pub job_type: Option<&'static str>,
    pub type_name: &'static str,
    pub timestamp_epoch_ms: u64,
}

impl From<&Event> for RecentEvent {
    fn from(event: &Event) -> Self {
        Self {
            correlation_id: event.correlation_id,
            job_type: event.job_type,
            type_name: event.type_name(),
            timestamp_epoch_ms: event.timestamp_epoch_ms,
        }
    }
}

struct Ring {
    buffer: VecDeque<RecentEvent>,
    capacity: usize,
}

impl Ring {
    fn push(&mut self, event: RecentEvent) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }
}

/// Subscribes to a `SignalBus` at construction and accumulates the last
/// `ring_capacity` events, alongside on-demand snapshots of a
/// `DispatcherRegistry` and a `NetworkQueueStorage`. One instance per bus
/// it watches; construct more for isolated scopes, mirroring
/// [`crate::orchestrator::Orchestrator`]'s own subscribe-at-construction
/// shape.
pub struct DiagnosticsView {
    registry: Arc<DispatcherRegistry>,
    queue_storage: Arc<dyn NetworkQueueStorage>,
    ring: Arc<Mutex<Ring>>,
    unsubscribe: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl DiagnosticsView {
    /// `ring_capacity` bounds the recent-events buffer; 0 is treated as 1
    /// so the buffer is never degenerate.
    pub fn new(
        registry: Arc<DispatcherRegistry>,
        queue_storage: Arc<dyn NetworkQueueStorage>,
        bus: &SignalBus,
        ring_capacity: usize,
    ) -> Self {
        let ring = Arc::new(Mutex::new(Ring { buffer: VecDeque::new(), capacity: ring_capacity.max(1) }));
        let for_listener = ring.clone();
        let unsubscribe = bus.listen(move |event: &Event| for_listener.lock().push(event.into()));
        Self { registry, queue_storage, ring, unsubscribe: Mutex::new(Some(Box::new(unsubscribe))) }
    }

    /// `{job_type_name -> executor_type_name}` snapshot (spec §4.1
    /// routing table), same shape as
    /// [`DispatcherRegistry::registered_executors`].
    pub fn registered_executors(&self) -> HashMap<&'static str, &'static str> {
        self.registry.registered_executors()
    }

    /// Queued offline entries at the moment of the call. Collapses a
    /// storage failure to an empty snapshot — diagnostics must never
    /// propagate an error the caller can't act on.
    pub fn offline_queue_snapshot(&self) -> Vec<OfflineQueueEntry> {
        self.queue_storage.get_all().unwrap_or_default()
    }

    pub fn offline_queue_depth(&self) -> usize {
        self.offline_queue_snapshot().len()
    }

    /// Buffered events, oldest first, up to the configured ring capacity.
    pub fn recent_events(&self) -> Vec<RecentEvent> {
        self.ring.lock().buffer.iter().cloned().collect()
    }

    /// Unsubscribe from the bus. Idempotent.
    pub fn dispose(&self) {
        if let Some(unsubscribe) = self.unsubscribe.lock().take() {
            unsubscribe();
        }
    }
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
