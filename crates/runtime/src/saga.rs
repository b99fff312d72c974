// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SagaFlow`: compensating rollback for a single multi-step orchestrator
//! script (spec §4.8).
//!
//! Intra-operation and LIFO on failure, unlike [`crate::undo::UndoStackManager`]
//! which is cross-operation and cursor-based; the two are independent and
//! share only the dispatcher (spec §9, "Saga vs. Undo").

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;

type Compensation = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Accumulates compensating actions for a sequence of steps run via `run`,
/// so a later step's failure can unwind the steps that already succeeded.
#[derive(Default)]
pub struct SagaFlow {
    compensations: Mutex<Vec<Compensation>>,
}

impl SagaFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action`. On success, registers `compensate(result)` for later
    /// `rollback()`; on failure, the error is returned without registering
    /// anything (there is nothing to compensate for a step that never
    /// completed).
    pub async fn run<T, E, Fut, C, CFut>(&self, action: impl FnOnce() -> Fut, compensate: C) -> Result<T, E>
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = Result<T, E>>,
        C: FnOnce(T) -> CFut + Send + 'static,
        CFut: Future<Output = ()> + Send + 'static,
    {
        let result = action().await;
        if let Ok(value) = &result {
            let value = value.clone();
            self.compensations.lock().push(Box::new(move || Box::pin(compensate(value))));
        }
        result
    }

    /// Run every registered compensation in LIFO order. Each runs on its
    /// own spawned task so a panicking compensation doesn't abort the
    /// remaining ones — best-effort unwind, not a transactional rollback.
    pub async fn rollback(&self) {
        let compensations: Vec<Compensation> = std::mem::take(&mut *self.compensations.lock());
        for compensation in compensations.into_iter().rev() {
            if let Err(join_err) = tokio::spawn(compensation()).await {
                tracing::warn!(error = %join_err, "compensation panicked during rollback, continuing");
            }
        }
    }

    /// Clear registered compensations without running them, for use after a
    /// script completes successfully end to end.
    pub fn commit(&self) {
        self.compensations.lock().clear();
    }

    pub fn pending_compensations(&self) -> usize {
        self.compensations.lock().len()
    }
}

#[cfg(test)]
#[path = "saga_tests.rs"]
mod tests;
