// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enumerated runtime configuration (spec §6).

use std::collections::HashMap;
use std::time::Duration;

/// Process-wide configuration for the runtime. Every field here corresponds
/// to an enumerated option in the specification's External Interfaces
/// section; there are no other knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Gates a verbose logger (teacher's `Effect::verbose` convention).
    pub debug_logging: bool,
    /// Default per-event-type cap for [`jobkit_bus`]'s circuit breaker.
    pub max_events_per_second: u32,
    /// Per-event-type overrides of `max_events_per_second`.
    pub type_event_limits: HashMap<&'static str, u32>,
    /// Offline queue entries exceeding this many retries are poisoned.
    pub offline_max_retries: u32,
    /// Whether `OfflineQueueManager::drain` runs automatically at process
    /// start when connectivity is already up.
    pub offline_drain_on_start: bool,
    /// Maximum undo history length before FIFO eviction.
    pub undo_max_history: usize,
    /// Window during which consecutive same-type undo pushes coalesce.
    /// Zero disables coalescing.
    pub undo_coalesce_window: Duration,
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            max_events_per_second: 50,
            type_event_limits: HashMap::from([("progress", 100)]),
            offline_max_retries: 5,
            offline_drain_on_start: true,
            undo_max_history: 100,
            undo_coalesce_window: Duration::from_millis(500),
        }
    }
}

/// Builder for [`RuntimeConfig`]; every setter mirrors a field above.
/// Fields sit directly on the builder (rather than behind a nested
/// `PartialConfig`) so [`crate::setters!`] can generate their setters —
/// the macro writes `self.$field`, not `self.config.$field`.
#[derive(Debug, Default)]
pub struct RuntimeConfigBuilder {
    debug_logging: Option<bool>,
    max_events_per_second: Option<u32>,
    type_event_limits: HashMap<&'static str, u32>,
    offline_max_retries: Option<u32>,
    offline_drain_on_start: Option<bool>,
    undo_max_history: Option<usize>,
    undo_coalesce_window: Option<Duration>,
}

impl RuntimeConfigBuilder {
    crate::setters! {
        option {
            debug_logging: bool,
            max_events_per_second: u32,
            offline_max_retries: u32,
            offline_drain_on_start: bool,
            undo_max_history: usize,
            undo_coalesce_window: Duration
        }
    }

    /// Merges one event-type override into the map rather than replacing
    /// it wholesale, so this can't be a plain `setters!`-generated setter
    /// (those set-or-replace a single field; this accumulates key/value
    /// pairs across repeated calls).
    pub fn type_event_limit(mut self, event_type: &'static str, limit: u32) -> Self {
        self.type_event_limits.insert(event_type, limit);
        self
    }

    pub fn build(self) -> RuntimeConfig {
        let defaults = RuntimeConfig::default();
        let mut type_event_limits = defaults.type_event_limits;
        type_event_limits.extend(self.type_event_limits);
        RuntimeConfig {
            debug_logging: self.debug_logging.unwrap_or(defaults.debug_logging),
            max_events_per_second: self
                .max_events_per_second
                .unwrap_or(defaults.max_events_per_second),
            type_event_limits,
            offline_max_retries: self.offline_max_retries.unwrap_or(defaults.offline_max_retries),
            offline_drain_on_start: self
                .offline_drain_on_start
                .unwrap_or(defaults.offline_drain_on_start),
            undo_max_history: self.undo_max_history.unwrap_or(defaults.undo_max_history),
            undo_coalesce_window: self
                .undo_coalesce_window
                .unwrap_or(defaults.undo_coalesce_window),
        }
    }
}
