// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared by every stage of the job lifecycle.

use crate::ids::JobId;
use thiserror::Error;

/// Errors a dispatched job can fail with, surfaced through the job's
/// [`crate::job::JobHandle`]-equivalent terminal future and mirrored as a
/// `JobFailure`/`JobCancelled`/`JobTimeout` event on the bus.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// No executor is registered for the dispatched job's type.
    #[error("no executor registered for job type {job_type}")]
    NoExecutor { job_type: &'static str },

    /// Cooperative cancellation fired before or during `process`.
    #[error("cancelled{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Cancelled { reason: Option<String> },

    /// The job's deadline elapsed before `process` returned.
    #[error("timed out after {duration_ms}ms")]
    TimedOut { duration_ms: u64 },

    /// `process` returned an error.
    #[error("process failed: {cause}")]
    ProcessFailure { cause: String, stack: Option<String>, was_retried: bool },

    /// Cache read/write failed. Non-fatal for reads (execution proceeds as
    /// a cache miss); logged for writes.
    #[error("cache I/O error: {cause}")]
    CacheIo { cause: String },

    /// Offline queue storage failed.
    #[error("offline queue storage error: {cause}")]
    QueueIo { cause: String },

    /// An offline queue entry exceeded its retry budget.
    #[error("job {job_id} poisoned after exceeding retry budget: {last_cause}")]
    Poisoned { job_id: JobId, last_cause: String },

    /// The offline queue rejected an enqueue (e.g. storage full).
    #[error("enqueue rejected for job {job_id}: {cause}")]
    EnqueueRejected { job_id: JobId, cause: String },

    /// The bus dropped an event because its per-type rate limit was
    /// exceeded. Logged, never raised to a caller; kept here so diagnostics
    /// code can represent it uniformly with the other error kinds.
    #[error("circuit tripped for event type {event_type}")]
    CircuitTripped { event_type: &'static str },
}

impl EngineError {
    /// True for the two lifecycle outcomes that the engine must never retry
    /// (§4.2: "Cancelled and TimedOut are not retried").
    pub fn is_terminal_non_retryable(&self) -> bool {
        matches!(self, EngineError::Cancelled { .. } | EngineError::TimedOut { .. })
    }
}
