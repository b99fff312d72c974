// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `UndoStackManager`: linear, preserve-all undo/redo history over a single
//! `ReversibleJob` type (spec §4.7).
//!
//! Generic over one job type `J`, the same simplification
//! `jobkit_offline::OfflineQueueManager` makes over `NetworkAction` jobs —
//! a host with several undoable job types runs one manager per type.
//!
//! Rather than persisting `ReversibleJob::make_inverse`'s boxed, non-`Clone`
//! inverse job long-term, each [`UndoEntry`] keeps the original job and its
//! result (both required to be `Clone`) and rebuilds the inverse fresh at
//! undo time via `make_inverse`. This is equivalent in effect — the inverse
//! is a pure function of `(original_job, original_result)` — and it lets the
//! same entry be undone and redone an unbounded number of times without
//! needing a dyn-clone capability on `Job`.

use crate::error::UndoError;
use jobkit_core::clock::epoch_ms_now;
use jobkit_core::job::ReversibleJob;
use jobkit_dispatch::DispatcherRegistry;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Optional callbacks around `undo`/`redo`, analogous to
/// [`jobkit_core::observer::Observer`] but scoped to undo transitions.
/// Exceptions are the caller's concern, not guarded here, because unlike
/// `Observer` these hooks can veto the operation (`on_before_undo`).
pub trait UndoHooks<J: ReversibleJob>: Send + Sync {
    fn on_before_undo(&self, _description: Option<&str>) -> bool {
        true
    }

    fn on_after_undo(&self, _description: Option<&str>) {}

    fn on_error(&self, _err: &UndoError) {}
}

/// The default when no hooks are configured.
pub struct NoopUndoHooks;

impl<J: ReversibleJob> UndoHooks<J> for NoopUndoHooks {}

#[derive(Clone)]
pub struct UndoEntry<J: ReversibleJob> {
    pub original_job: J,
    pub original_result: J::Output,
    pub description: Option<String>,
    pub timestamp_epoch_ms: u64,
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoToStrategy {
    /// Halt at the first failing undo, preserving whatever partial progress
    /// was made.
    StopOnError,
    /// Move the cursor past a failing entry without having actually undone
    /// it, then keep going.
    SkipAndContinue,
    /// On the first failure, re-redo everything undone so far in this call
    /// (LIFO), restoring the pre-call cursor position.
    RollbackAll,
}

#[derive(Debug, Clone)]
pub struct UndoToResult {
    pub attempted: usize,
    pub undone: usize,
    pub final_index: isize,
    pub failing_entry: Option<String>,
}

/// Linear, preserve-all undo/redo history for `ReversibleJob`s of type `J`.
///
/// `push` after `undo` does **not** truncate the entries beyond the new
/// cursor position — they remain redoable until evicted by `max_history` or
/// overwritten by coalescing (§4.7's "linear history, preserve all";
/// `DESIGN.md` records this choice over the alternative "truncate on push"
/// reading some source comments suggested).
pub struct UndoStackManager<J: ReversibleJob> {
    dispatcher: Arc<DispatcherRegistry>,
    max_history: usize,
    coalesce_window: Duration,
    hooks: Arc<dyn UndoHooks<J>>,
    history: Mutex<Vec<UndoEntry<J>>>,
    current_index: Mutex<isize>,
}

impl<J> UndoStackManager<J>
where
    J: ReversibleJob + Clone,
    J::Output: Clone,
{
    pub fn new(dispatcher: Arc<DispatcherRegistry>, max_history: usize, coalesce_window: Duration) -> Self {
        Self {
            dispatcher,
            max_history: max_history.max(1),
            coalesce_window,
            hooks: Arc::new(NoopUndoHooks),
            history: Mutex::new(Vec::new()),
            current_index: Mutex::new(-1),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn UndoHooks<J>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn can_undo(&self) -> bool {
        *self.current_index.lock() >= 0
    }

    pub fn can_redo(&self) -> bool {
        let idx = *self.current_index.lock();
        idx < self.history.lock().len() as isize - 1
    }

    pub fn current_index(&self) -> isize {
        *self.current_index.lock()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Record a completed `ReversibleJob`'s effect. Coalesces into the
    /// current top-of-stack entry when `coalesce_window > 0` and that entry
    /// is within the window — keeping its `original_job` but adopting the
    /// new `result`/`description`/`timestamp`, so a single `undo()` reverts
    /// the whole burst back to the state before its first push.
    ///
    /// Otherwise inserts the new entry immediately after `current_index`
    /// rather than appending at the end, so entries left over from a prior
    /// `undo()` are shifted along rather than dropped — they stay in
    /// `history` and remain reachable by further `redo()` calls, per the
    /// "linear, preserve-all" history this manager implements.
    pub fn push(&self, job: J, result: J::Output, source_id: Option<String>) {
        let now = epoch_ms_now();
        let description = job.description();
        let mut history = self.history.lock();
        let mut idx = self.current_index.lock();

        let can_coalesce = !self.coalesce_window.is_zero()
            && *idx >= 0
            && *idx as usize == history.len() - 1
            && now.saturating_sub(history[*idx as usize].timestamp_epoch_ms)
                <= self.coalesce_window.as_millis() as u64;

        if can_coalesce {
            let top = &mut history[*idx as usize];
            top.original_result = result;
            top.description = description;
            top.timestamp_epoch_ms = now;
            top.source_id = source_id;
            return;
        }

        let insert_at = (*idx + 1) as usize;
        history.insert(
            insert_at,
            UndoEntry {
                original_job: job,
                original_result: result,
                description,
                timestamp_epoch_ms: now,
                source_id,
            },
        );
        *idx = insert_at as isize;

        if history.len() > self.max_history {
            history.remove(0);
            *idx -= 1;
        }
    }

    /// Undo the entry at `current_index`, decrementing it on success. The
    /// cursor only moves if the inverse job's dispatch actually succeeds.
    pub async fn undo(&self) -> Result<(), UndoError> {
        let idx = *self.current_index.lock();
        if idx < 0 {
            return Err(UndoError::NothingToUndo);
        }

        let (original_job, original_result, description) = {
            let history = self.history.lock();
            let entry = &history[idx as usize];
            (entry.original_job.clone(), entry.original_result.clone(), entry.description.clone())
        };

        if !self.hooks.on_before_undo(description.as_deref()) {
            return Err(UndoError::CancelledByHook);
        }

        let inverse_job = original_job.make_inverse(&original_result);
        let handle = self.dispatcher.dispatch_boxed(inverse_job);
        match handle.result().await {
            Ok(_) => {
                *self.current_index.lock() = idx - 1;
                self.hooks.on_after_undo(description.as_deref());
                Ok(())
            }
            Err(engine_err) => {
                let err = UndoError::DispatchFailed(engine_err);
                self.hooks.on_error(&err);
                Err(err)
            }
        }
    }

    /// Redo the entry one past `current_index`, symmetric to `undo`: the
    /// cursor advances *before* dispatch and rolls back on error.
    pub async fn redo(&self) -> Result<(), UndoError> {
        let idx = *self.current_index.lock();
        let len = self.history.lock().len() as isize;
        if idx >= len - 1 {
            return Err(UndoError::NothingToRedo);
        }
        let next_idx = idx + 1;

        let (original_job, description) = {
            let history = self.history.lock();
            let entry = &history[next_idx as usize];
            (entry.original_job.clone(), entry.description.clone())
        };

        *self.current_index.lock() = next_idx;
        let handle = self.dispatcher.dispatch(original_job);
        match handle.result().await {
            Ok(_) => {
                self.hooks.on_after_undo(description.as_deref());
                Ok(())
            }
            Err(engine_err) => {
                *self.current_index.lock() = idx;
                let err = UndoError::DispatchFailed(engine_err);
                self.hooks.on_error(&err);
                Err(err)
            }
        }
    }

    /// Repeatedly `undo()` until `current_index == target_index` (a no-op
    /// if the cursor is already at or before `target_index`, since this
    /// only walks backward).
    pub async fn undo_to(&self, target_index: isize, strategy: UndoToStrategy) -> UndoToResult {
        let mut attempted = 0;
        let mut undone = 0;
        let mut failing_entry = None;

        loop {
            let idx = *self.current_index.lock();
            if idx <= target_index {
                break;
            }
            attempted += 1;
            match self.undo().await {
                Ok(()) => undone += 1,
                Err(err) => {
                    failing_entry = Some(err.to_string());
                    match strategy {
                        UndoToStrategy::StopOnError => break,
                        UndoToStrategy::SkipAndContinue => {
                            *self.current_index.lock() -= 1;
                        }
                        UndoToStrategy::RollbackAll => {
                            for _ in 0..undone {
                                let _ = self.redo().await;
                            }
                            undone = 0;
                            break;
                        }
                    }
                }
            }
        }

        UndoToResult { attempted, undone, final_index: *self.current_index.lock(), failing_entry }
    }

    /// Find the last entry pushed at or before `ts_epoch_ms` and `undo_to`
    /// its index; if every entry postdates `ts_epoch_ms`, rewinds to -1
    /// (undoes everything).
    pub async fn undo_to_timestamp(&self, ts_epoch_ms: u64, strategy: UndoToStrategy) -> UndoToResult {
        let target_index = {
            let history = self.history.lock();
            history
                .iter()
                .rposition(|entry| entry.timestamp_epoch_ms <= ts_epoch_ms)
                .map(|i| i as isize)
                .unwrap_or(-1)
        };
        self.undo_to(target_index, strategy).await
    }
}

#[cfg(test)]
#[path = "undo_tests.rs"]
mod tests;
