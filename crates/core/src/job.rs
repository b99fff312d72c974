// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Job` trait family: identity/request data plus the capability-query
//! extension points (`EventJob`, `NetworkAction`, `ReversibleJob`).
//!
//! A job is polymorphic over an open set of capabilities rather than a
//! closed enum of variants, so third-party job types can opt into a
//! capability without the core needing to know about them. Each capability
//! is queried through a `Option<&dyn Trait>`-returning accessor with a
//! `None` default; concrete job types override the accessor to `Some(self)`
//! only when they also implement the capability trait. See `DESIGN.md` for
//! why this was preferred over a closed tagged enum of job variants.

use crate::cancellation::CancellationToken;
use crate::event::DomainEvent;
use crate::ids::JobId;
use crate::retry::RetryPolicy;
use crate::source::DataSource;
use std::time::Duration;

/// The terminal value a job produces: the payload plus its provenance.
#[derive(Debug, Clone)]
pub struct JobResult<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> JobResult<T> {
    pub fn new(data: T, source: DataSource) -> Self {
        Self { data, source }
    }

    pub fn fresh(data: T) -> Self {
        Self::new(data, DataSource::Fresh)
    }

    pub fn cached(data: T) -> Self {
        Self::new(data, DataSource::Cached)
    }

    pub fn optimistic(data: T) -> Self {
        Self::new(data, DataSource::Optimistic)
    }
}

/// Immutable unit of work submitted to a [`jobkit_dispatch`]-equivalent
/// dispatcher. A concrete job type is consumed exactly once by the
/// executor engine; retries and redos construct a fresh logical attempt
/// from the same value.
pub trait Job: Send + Sync + 'static {
    /// The value the executor's `process` produces on success.
    type Output: Send + Sync + 'static;

    fn id(&self) -> JobId;

    /// Stable type-hint used for executor routing, rate-limit bucketing,
    /// and diagnostics. Distinct from [`JobId`]'s random prefix.
    fn job_type(&self) -> &'static str;

    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn cancellation_token(&self) -> Option<CancellationToken> {
        None
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }

    /// Cache key for the cache+SWR interaction (§4.2). `None` disables
    /// caching entirely for this job.
    fn cache_key(&self) -> Option<String> {
        None
    }

    fn cache_ttl(&self) -> Option<Duration> {
        None
    }

    /// Stale-while-revalidate: continue to a fresh `process` after a cache
    /// hit without affecting the handle's already-completed result.
    fn revalidate(&self) -> bool {
        false
    }

    /// `Some(self)` if this job also implements [`EventJob`].
    fn as_event_job(&self) -> Option<&dyn EventJob<Output = Self::Output>> {
        None
    }

    /// `Some(self)` if this job also implements [`NetworkAction`].
    fn as_network_action(&self) -> Option<&dyn NetworkAction<Output = Self::Output>> {
        None
    }

    /// `Some(self)` if this job also implements [`ReversibleJob`].
    fn as_reversible(&self) -> Option<&dyn ReversibleJob<Output = Self::Output>> {
        None
    }

    /// Type-erased view of this job, for the rare caller that needs to
    /// recover the concrete type behind a `Box<dyn Job<Output = T>>` (e.g.
    /// [`ReversibleJob::make_inverse`]'s boxed inverse, routed back through
    /// a [`jobkit_dispatch`]-equivalent registry by `TypeId`). Never
    /// overridden; `Self: 'static` makes the unsizing coercion sound for
    /// every implementor.
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    /// Owning counterpart of [`Job::as_any`], for routing a boxed, erased
    /// job back to its concrete type via `Box<dyn Any>::downcast`.
    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
        self
    }
}

/// Capability: the job can render its own result as a domain event instead
/// of relying on the generic `JobSuccess` framework event.
pub trait EventJob: Job {
    /// Build the domain event to broadcast for `result`. Called both on a
    /// cache hit (with the cached value) and on a fresh success (with the
    /// fresh value) — each call gets its own [`crate::event::Event`]
    /// envelope carrying the *current* job's id as `correlation_id`
    /// (invariant 2).
    fn make_event(&self, result: &Self::Output) -> Box<dyn DomainEvent>;
}

/// Capability: the job represents a network side effect that must be
/// queued rather than attempted while offline.
pub trait NetworkAction: Job {
    /// Value to optimistically complete the handle with when the job is
    /// queued instead of executed immediately. `None` leaves the handle
    /// open until the queue later drains it successfully.
    fn optimistic_value(&self) -> Option<Self::Output> {
        None
    }
}

/// Capability: the job's effect can be undone by dispatching an inverse
/// job built from its result.
pub trait ReversibleJob: Job {
    /// Build the job that, when dispatched, reverses this job's effect
    /// given its `result`. Boxed rather than returned as `Self` so the
    /// trait stays object-safe for the `as_reversible` capability query.
    fn make_inverse(&self, result: &Self::Output) -> Box<dyn Job<Output = Self::Output>>;

    /// Human-readable description for undo-history UIs (e.g. "Delete item").
    fn description(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
