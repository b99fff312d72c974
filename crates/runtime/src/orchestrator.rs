// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Orchestrator<S>`: the reactive-container half of the runtime (spec
//! §4.6) — a state snapshot plus a single `on_event` reducer driven by the
//! bus, and the `active_job_ids` bookkeeping dispatch needs to tell its own
//! jobs apart from ones observed secondhand on the bus.

use jobkit_core::event::{Event, FrameworkEvent};
use jobkit_core::ids::JobId;
use jobkit_core::job::Job;
use jobkit_bus::SignalBus;
use jobkit_dispatch::{DispatcherRegistry, JobHandle};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Grace period before a completed job's id is dropped from
/// `active_job_ids`, so a reducer reacting to the terminal event still sees
/// `is_job_running` return `true` for the job that just finished.
pub const ACTIVE_JOB_GRACE: Duration = Duration::from_millis(50);

/// Reduces the current state and an observed bus event to the next state.
/// The consumer overrides this (directly or via [`FnReducer`]) rather than
/// the engine dictating a closed set of state transitions — the same
/// "consumer supplies the logic, framework supplies the plumbing" split as
/// [`jobkit_engine::Process`].
pub trait Reducer<S>: Send + Sync {
    fn on_event(&self, state: &S, event: &Event) -> S;
}

/// Adapts a plain closure to [`Reducer`], mirroring `jobkit_engine::FnProcess`.
pub struct FnReducer<F>(pub F);

impl<S, F> Reducer<S> for FnReducer<F>
where
    F: Fn(&S, &Event) -> S + Send + Sync,
{
    fn on_event(&self, state: &S, event: &Event) -> S {
        (self.0)(state, event)
    }
}

fn is_terminal_shaped(event: &Event) -> bool {
    match event.as_framework() {
        Some(FrameworkEvent::JobSuccess { .. })
        | Some(FrameworkEvent::JobFailure { .. })
        | Some(FrameworkEvent::JobCancelled { .. })
        | Some(FrameworkEvent::JobTimeout { .. }) => true,
        Some(_) => false,
        // A domain event only ever replaces a `JobSuccess` in this engine
        // (see `BaseExecutor::emit_success`), so treat it the same way.
        None => true,
    }
}

/// Holds an immutable state snapshot of type `S`, updated by a single
/// reducer driven off the [`SignalBus`]. One instance typically backs one
/// screen/feature's worth of orchestration; construct more for isolated
/// scopes.
pub struct Orchestrator<S> {
    state_tx: tokio::sync::watch::Sender<S>,
    dispatcher: Arc<DispatcherRegistry>,
    reducer: Arc<dyn Reducer<S>>,
    active_job_ids: Arc<Mutex<HashSet<JobId>>>,
    unsubscribe: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl<S: Clone + Send + Sync + 'static> Orchestrator<S> {
    /// Builds the orchestrator and subscribes it to `bus`. Returned as an
    /// `Arc` because the bus subscription captures a [`Weak`] back-reference
    /// to the orchestrator — `Arc::new_cyclic` is how that self-reference is
    /// wired up without ever materializing a strong self-cycle.
    pub fn new(
        initial_state: S,
        bus: SignalBus,
        dispatcher: Arc<DispatcherRegistry>,
        reducer: Arc<dyn Reducer<S>>,
    ) -> Arc<Self> {
        let (state_tx, _rx) = tokio::sync::watch::channel(initial_state);
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak_for_listener = weak.clone();
            let unsubscribe = bus.listen(move |event| {
                if let Some(this) = weak_for_listener.upgrade() {
                    this.handle_event(event);
                }
            });
            Self {
                state_tx,
                dispatcher,
                reducer,
                active_job_ids: Arc::new(Mutex::new(HashSet::new())),
                unsubscribe: Mutex::new(Some(Box::new(unsubscribe))),
            }
        })
    }

    fn handle_event(&self, event: &Event) {
        let current = self.state_tx.borrow().clone();
        let next = self.reducer.on_event(&current, event);
        let _ = self.state_tx.send(next);

        if !is_terminal_shaped(event) {
            return;
        }
        let job_id = event.correlation_id;
        if !self.active_job_ids.lock().contains(&job_id) {
            return;
        }
        let active_job_ids = self.active_job_ids.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ACTIVE_JOB_GRACE).await;
            active_job_ids.lock().remove(&job_id);
        });
    }

    /// Current state snapshot.
    pub fn state(&self) -> S {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state snapshots. Every `emit` (including duplicates of
    /// the current value) produces a notification — no value-equality
    /// dedup is applied.
    pub fn stream(&self) -> tokio::sync::watch::Receiver<S> {
        self.state_tx.subscribe()
    }

    /// Publish `new_state` directly, bypassing the reducer. Used by
    /// consumers that compute a transition outside of a bus event (e.g. in
    /// response to a user action before any job is dispatched).
    pub fn emit(&self, new_state: S) {
        let _ = self.state_tx.send(new_state);
    }

    /// Dispatch `job` through the orchestrator's registry, tracking its id
    /// as active until ~50ms after its terminal event is observed.
    pub fn dispatch<J: Job>(&self, job: J) -> JobHandle<J::Output> {
        self.active_job_ids.lock().insert(job.id());
        self.dispatcher.dispatch(job)
    }

    /// Whether `correlation_id` is a job this orchestrator itself dispatched
    /// and hasn't yet finished grace-period bookkeeping for. The reducer
    /// uses this to tell its own dispatches apart from events observed
    /// secondhand on the bus; the engine itself makes no such distinction.
    pub fn is_job_running(&self, correlation_id: JobId) -> bool {
        self.active_job_ids.lock().contains(&correlation_id)
    }

    /// Unsubscribe from the bus and close the state stream. Idempotent.
    pub fn dispose(&self) {
        if let Some(unsubscribe) = self.unsubscribe.lock().take() {
            unsubscribe();
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
