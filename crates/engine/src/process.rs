// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user-supplied `process(job)` step the engine drives through
//! cache/timeout/cancellation/retry (spec §4.2), plus the narrow progress
//! capability it's handed.

use async_trait::async_trait;
use jobkit_core::clock::epoch_ms_now;
use jobkit_core::error::EngineError;
use jobkit_core::event::{Event, FrameworkEvent};
use jobkit_core::ids::JobId;
use jobkit_core::job::Job;
use jobkit_core::observer::{guarded, Observer};
use jobkit_dispatch::JobHandleController;
use std::panic::AssertUnwindSafe;

/// What a running `process` call is allowed to do with the job's handle:
/// push a progress update and have it mirrored on the bus. Deliberately
/// narrower than `JobHandleController` itself — `process` has no business
/// completing or failing the handle directly, that's `BaseExecutor`'s job.
pub struct ProgressReporter<'a, T> {
    controller: &'a JobHandleController<T>,
    bus: &'a jobkit_bus::SignalBus,
    observer: &'a dyn Observer,
    job_id: JobId,
    job_type: &'static str,
}

impl<'a, T> ProgressReporter<'a, T> {
    pub(crate) fn new(
        controller: &'a JobHandleController<T>,
        bus: &'a jobkit_bus::SignalBus,
        observer: &'a dyn Observer,
        job_id: JobId,
        job_type: &'static str,
    ) -> Self {
        Self { controller, bus, observer, job_id, job_type }
    }

    /// Push `value`/`message` onto the handle's progress stream and emit
    /// `FrameworkEvent::JobProgress` on the bus (spec.md:87: "Executors call
    /// `report_progress`, which both pushes onto the handle's progress
    /// stream and emits `JobProgress` on the bus").
    pub fn report(&self, value: f64, message: Option<String>) {
        self.controller.report_progress(value, message.clone());
        let event = Event::framework(
            self.job_id,
            epoch_ms_now(),
            Some(self.job_type),
            FrameworkEvent::JobProgress { value, message },
        );
        guarded(AssertUnwindSafe(|| self.observer.on_event(&event)));
        self.bus.emit(event);
    }
}

#[async_trait]
pub trait Process<J: Job>: Send + Sync {
    async fn process(
        &self,
        job: &J,
        progress: &ProgressReporter<'_, J::Output>,
    ) -> Result<J::Output, EngineError>;
}

/// Adapts an async closure to [`Process`], for registering executors
/// without a dedicated type.
pub struct FnProcess<F>(pub F);

#[async_trait]
impl<J, F, Fut> Process<J> for FnProcess<F>
where
    J: Job,
    F: Fn(&J, &ProgressReporter<'_, J::Output>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<J::Output, EngineError>> + Send,
{
    async fn process(
        &self,
        job: &J,
        progress: &ProgressReporter<'_, J::Output>,
    ) -> Result<J::Output, EngineError> {
        (self.0)(job, progress).await
    }
}
