// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide observer hook for job lifecycle telemetry.

use crate::error::EngineError;
use crate::event::Event;
use crate::ids::JobId;

/// Receives lifecycle callbacks from the executor engine for every job,
/// regardless of which caller dispatched it. Intended for logging/metrics
/// sinks, not for control flow.
///
/// Exceptions (panics) raised by an observer implementation must never
/// propagate into the engine; callers of [`Observer`] methods are expected
/// to guard invocations the way [`crate::cancellation::CancellationToken`]
/// guards its listener callbacks.
pub trait Observer: Send + Sync {
    fn on_job_start(&self, job_id: JobId, job_type: &'static str) {
        let _ = (job_id, job_type);
    }

    fn on_job_success(&self, job_id: JobId, job_type: &'static str) {
        let _ = (job_id, job_type);
    }

    fn on_job_error(&self, job_id: JobId, job_type: &'static str, error: &EngineError) {
        let _ = (job_id, job_type, error);
    }

    fn on_event(&self, event: &Event) {
        let _ = event;
    }
}

/// An [`Observer`] that does nothing; the default when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Invoke an observer callback, catching panics so a misbehaving observer
/// can never interrupt the engine's own lifecycle processing.
pub fn guarded(f: impl FnOnce() + std::panic::UnwindSafe) {
    let _ = std::panic::catch_unwind(f);
}
