// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobHandle<T>`: the terminal result future plus progress stream created
//! at dispatch (spec §4.3).

use jobkit_core::error::EngineError;
use jobkit_core::ids::JobId;
use jobkit_core::job::JobResult;
use jobkit_core::source::DataSource;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};

/// Bound on the progress stream's buffer. Unbounded progress reporting
/// would let a runaway executor pin arbitrary memory; 64 comfortably
/// covers any UI-facing progress bar without coalescing.
pub const DEFAULT_PROGRESS_BUFFER: usize = 64;

type Terminal<T> = Result<JobResult<T>, EngineError>;

struct Shared {
    completed: AtomicBool,
    job_id: JobId,
}

/// Caller-facing half of a dispatched job.
pub struct JobHandle<T> {
    result_rx: Option<oneshot::Receiver<Terminal<T>>>,
    progress_tx: broadcast::Sender<(f64, Option<String>)>,
    shared: Arc<Shared>,
}

/// Engine-facing half: completes the handle and reports progress.
/// `complete`/`complete_error` are idempotent after the first call — later
/// calls are silently ignored (spec invariant 3).
pub struct JobHandleController<T> {
    result_tx: Mutex<Option<oneshot::Sender<Terminal<T>>>>,
    progress_tx: broadcast::Sender<(f64, Option<String>)>,
    shared: Arc<Shared>,
}

impl<T: Send + 'static> JobHandle<T> {
    pub fn pair(job_id: JobId) -> (Self, JobHandleController<T>) {
        Self::pair_with_buffer(job_id, DEFAULT_PROGRESS_BUFFER)
    }

    pub fn pair_with_buffer(
        job_id: JobId,
        progress_buffer: usize,
    ) -> (Self, JobHandleController<T>) {
        let (result_tx, result_rx) = oneshot::channel();
        let (progress_tx, _) = broadcast::channel(progress_buffer.max(1));
        let shared = Arc::new(Shared { completed: AtomicBool::new(false), job_id });
        (
            Self { result_rx: Some(result_rx), progress_tx: progress_tx.clone(), shared: shared.clone() },
            JobHandleController { result_tx: Mutex::new(Some(result_tx)), progress_tx, shared },
        )
    }

    pub fn job_id(&self) -> JobId {
        self.shared.job_id
    }

    pub fn is_completed(&self) -> bool {
        self.shared.completed.load(Ordering::SeqCst)
    }

    /// Await the terminal result. Consumes the handle — the future
    /// resolves exactly once per the spec's single-shot contract.
    pub async fn result(mut self) -> Terminal<T> {
        match self.result_rx.take() {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(EngineError::Cancelled {
                    reason: Some("handle dropped before completion".to_string()),
                })
            }),
            None => Err(EngineError::Cancelled {
                reason: Some("result() already awaited".to_string()),
            }),
        }
    }

    /// Subscribe to progress updates. Each subscriber gets its own queue
    /// of up to the configured buffer size; the stream ends once the
    /// controller is dropped.
    pub fn progress(&self) -> broadcast::Receiver<(f64, Option<String>)> {
        self.progress_tx.subscribe()
    }
}

impl<T: Send + 'static> JobHandleController<T> {
    pub fn job_id(&self) -> JobId {
        self.shared.job_id
    }

    pub fn is_completed(&self) -> bool {
        self.shared.completed.load(Ordering::SeqCst)
    }

    /// Push a progress update onto the handle's stream. Emits nothing on
    /// the bus itself — `jobkit_engine::process::ProgressReporter` wraps
    /// this call and emits `FrameworkEvent::JobProgress` alongside it, so
    /// callers reach this through that wrapper rather than directly.
    pub fn report_progress(&self, value: f64, message: Option<String>) {
        let _ = self.progress_tx.send((value.clamp(0.0, 1.0), message));
    }

    pub fn complete(&self, data: T, source: DataSource) {
        self.complete_result(Ok(JobResult::new(data, source)));
    }

    pub fn complete_error(&self, error: EngineError) {
        self.complete_result(Err(error));
    }

    fn complete_result(&self, result: Terminal<T>) {
        let mut slot = self.result_tx.lock();
        if let Some(tx) = slot.take() {
            self.shared.completed.store(true, Ordering::SeqCst);
            let _ = tx.send(result);
        }
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
