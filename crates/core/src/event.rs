// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event envelope, framework event variants, and the domain-event boundary.

use crate::ids::{EventId, JobId};
use crate::source::DataSource;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Boundary trait for user-defined ("domain") events. The bus and
/// orchestrators treat these as opaque except for downcasting via
/// [`DomainEvent::as_any`] — the capability-query idiom used throughout this
/// crate (see `Job::as_event_job` and friends) rather than a closed enum of
/// every possible domain event.
pub trait DomainEvent: fmt::Debug + Send + Sync + 'static {
    /// Stable name for logging/diagnostics/rate-limit bucketing.
    fn event_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

/// Downcast a type-erased domain event back to its concrete type.
pub fn downcast_domain<T: DomainEvent>(event: &dyn DomainEvent) -> Option<&T> {
    event.as_any().downcast_ref::<T>()
}

/// Framework-emitted lifecycle events (spec §3), retained for legacy
/// consumers that don't define a domain event for a given job type.
#[derive(Debug, Clone)]
pub enum FrameworkEvent {
    JobStarted,
    JobProgress { value: f64, message: Option<String> },
    JobSuccess { data: Arc<dyn Any + Send + Sync>, source: DataSource },
    JobFailure { error: String, stack: Option<String>, was_retried: bool },
    JobCancelled { reason: Option<String> },
    JobTimeout { duration: Duration },
    JobRetrying { attempt: u32, max: u32 },
    JobCacheHit,
    /// An offline queue entry was poisoned after exceeding its retry
    /// budget (spec §4.5); `job_id` is the original job's id, not the
    /// event's own correlation id.
    NetworkSyncFailure { job_id: JobId, reason: String },
}

impl FrameworkEvent {
    /// Stable name used for rate-limit bucketing and logging; matches the
    /// per-type override keys documented in [`crate::config::RuntimeConfig`].
    pub fn type_name(&self) -> &'static str {
        match self {
            FrameworkEvent::JobStarted => "job:started",
            FrameworkEvent::JobProgress { .. } => "progress",
            FrameworkEvent::JobSuccess { .. } => "job:success",
            FrameworkEvent::JobFailure { .. } => "job:failure",
            FrameworkEvent::JobCancelled { .. } => "job:cancelled",
            FrameworkEvent::JobTimeout { .. } => "job:timeout",
            FrameworkEvent::JobRetrying { .. } => "job:retrying",
            FrameworkEvent::JobCacheHit => "job:cache_hit",
            FrameworkEvent::NetworkSyncFailure { .. } => "job:network_sync_failure",
        }
    }
}

/// Either a framework lifecycle event or an opaque domain event.
pub enum EventPayload {
    Framework(FrameworkEvent),
    Domain(Box<dyn DomainEvent>),
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPayload::Framework(e) => write!(f, "Framework({e:?})"),
            EventPayload::Domain(e) => write!(f, "Domain({e:?})"),
        }
    }
}

/// An immutable event broadcast on the [`jobkit_bus`]-equivalent SignalBus.
///
/// `correlation_id` equals the originating job's id for every event the
/// executor engine emits on behalf of a job (invariant 1, §3). Never
/// mutated after construction.
#[derive(Debug)]
pub struct Event {
    pub id: EventId,
    pub correlation_id: JobId,
    pub timestamp_epoch_ms: u64,
    pub job_type: Option<&'static str>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(
        correlation_id: JobId,
        timestamp_epoch_ms: u64,
        job_type: Option<&'static str>,
        payload: EventPayload,
    ) -> Self {
        Self { id: EventId::new(), correlation_id, timestamp_epoch_ms, job_type, payload }
    }

    pub fn framework(
        correlation_id: JobId,
        timestamp_epoch_ms: u64,
        job_type: Option<&'static str>,
        event: FrameworkEvent,
    ) -> Self {
        Self::new(correlation_id, timestamp_epoch_ms, job_type, EventPayload::Framework(event))
    }

    pub fn domain(
        correlation_id: JobId,
        timestamp_epoch_ms: u64,
        job_type: Option<&'static str>,
        event: Box<dyn DomainEvent>,
    ) -> Self {
        Self::new(correlation_id, timestamp_epoch_ms, job_type, EventPayload::Domain(event))
    }

    /// Stable name used for rate-limit bucketing and logging.
    pub fn type_name(&self) -> &'static str {
        match &self.payload {
            EventPayload::Framework(f) => f.type_name(),
            EventPayload::Domain(d) => d.event_name(),
        }
    }

    pub fn as_framework(&self) -> Option<&FrameworkEvent> {
        match &self.payload {
            EventPayload::Framework(f) => Some(f),
            EventPayload::Domain(_) => None,
        }
    }

    pub fn as_domain<T: DomainEvent>(&self) -> Option<&T> {
        match &self.payload {
            EventPayload::Domain(d) => downcast_domain::<T>(d.as_ref()),
            EventPayload::Framework(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
