// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `BaseExecutor<J, P>`: the framework's implementation of
//! `jobkit_dispatch::Executor`, driving a job through cache read, the
//! user-supplied `process` step, timeout/cancellation, retry, and event
//! emission (spec §4.2).

use crate::offline_sink::OfflineSink;
use crate::process::{Process, ProgressReporter};
use async_trait::async_trait;
use jobkit_core::clock::epoch_ms_now;
use jobkit_core::error::EngineError;
use jobkit_core::event::{Event, FrameworkEvent};
use jobkit_core::ids::JobId;
use jobkit_core::job::Job;
use jobkit_core::observer::{guarded, Observer};
use jobkit_core::source::DataSource;
use jobkit_storage::cache::CacheProvider;
use jobkit_storage::connectivity::ConnectivityProvider;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Drives `J` through its lifecycle. Collaborators are trait objects rather
/// than further type parameters — `BaseExecutor<J, P, S, C, ...>` would
/// force every call site to name every collaborator's concrete type even
/// when it doesn't use one; `Arc<dyn Trait>` keeps the signature to the two
/// parameters that vary per executor (the job type and the `process` step).
pub struct BaseExecutor<J, P>
where
    J: Job,
    P: Process<J>,
{
    process: P,
    bus: jobkit_bus::SignalBus,
    cache: Option<Arc<dyn CacheProvider>>,
    connectivity: Option<Arc<dyn ConnectivityProvider>>,
    offline_sink: Option<Arc<dyn OfflineSink<J>>>,
    observer: Arc<dyn Observer>,
}

impl<J, P> BaseExecutor<J, P>
where
    J: Job,
    P: Process<J>,
{
    pub fn new(process: P, bus: jobkit_bus::SignalBus) -> Self {
        Self {
            process,
            bus,
            cache: None,
            connectivity: None,
            offline_sink: None,
            observer: Arc::new(jobkit_core::observer::NoopObserver),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn ConnectivityProvider>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn with_offline_sink(mut self, sink: Arc<dyn OfflineSink<J>>) -> Self {
        self.offline_sink = Some(sink);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    fn emit(&self, correlation_id: JobId, job_type: &'static str, event: FrameworkEvent) {
        let event = Event::framework(correlation_id, epoch_ms_now(), Some(job_type), event);
        guarded(AssertUnwindSafe(|| self.observer.on_event(&event)));
        self.bus.emit(event);
    }
}

#[async_trait]
impl<J, P> jobkit_dispatch::Executor<J> for BaseExecutor<J, P>
where
    J: Job,
    J::Output: Clone + Serialize + DeserializeOwned,
    P: Process<J>,
{
    async fn execute(
        &self,
        job: J,
        handle: jobkit_dispatch::JobHandleController<J::Output>,
    ) {
        self.run(job, handle).await;
    }
}

impl<J, P> BaseExecutor<J, P>
where
    J: Job,
    J::Output: Clone + Serialize + DeserializeOwned,
    P: Process<J>,
{
    async fn run(&self, job: J, handle: jobkit_dispatch::JobHandleController<J::Output>) {
        let job_id = job.id();
        let job_type = job.job_type();
        guarded(AssertUnwindSafe(|| self.observer.on_job_start(job_id, job_type)));
        self.emit(job_id, job_type, FrameworkEvent::JobStarted);

        let optimistic_value = job.as_network_action().and_then(|na| na.optimistic_value());
        let is_network_action = job.as_network_action().is_some();
        let is_offline =
            is_network_action && self.connectivity.as_ref().is_some_and(|c| !c.is_connected());

        if is_offline {
            self.hand_off_to_offline_queue(job, job_id, job_type, optimistic_value, handle).await;
            return;
        }

        let cache_key = job.cache_key();
        let mut completed_from_cache = false;
        if let (Some(key), Some(cache)) = (cache_key.as_deref(), self.cache.as_ref()) {
            match cache.read(key) {
                Ok(Some(entry)) => match serde_json::from_slice::<J::Output>(&entry.value) {
                    Ok(value) => {
                        self.emit_success(&job, job_id, job_type, &value, DataSource::Cached);
                        handle.complete(value, DataSource::Cached);
                        completed_from_cache = true;
                        if !job.revalidate() {
                            guarded(AssertUnwindSafe(|| {
                                self.observer.on_job_success(job_id, job_type)
                            }));
                            return;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            job_id = %job_id, job_type, error = %err,
                            "cache entry failed to deserialize, treating as miss"
                        );
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(job_id = %job_id, job_type, error = %err, "cache read failed, treating as miss");
                }
            }
        }

        let retry_policy = job.retry_policy().unwrap_or_default();
        let mut attempt = 0u32;
        loop {
            let outcome = self.run_once(&job, &handle).await;
            match outcome {
                Ok(value) => {
                    self.write_cache(job_id, job_type, cache_key.as_deref(), &job, &value);
                    if !completed_from_cache {
                        self.emit_success(&job, job_id, job_type, &value, DataSource::Fresh);
                        handle.complete(value, DataSource::Fresh);
                    }
                    guarded(AssertUnwindSafe(|| self.observer.on_job_success(job_id, job_type)));
                    return;
                }
                Err(err) => {
                    guarded(AssertUnwindSafe(|| {
                        self.observer.on_job_error(job_id, job_type, &err)
                    }));

                    let retryable =
                        !err.is_terminal_non_retryable() && retry_policy.can_retry(attempt, || true);
                    if !retryable {
                        self.emit_terminal_error(job_id, job_type, &err, attempt > 0);
                        if !completed_from_cache {
                            handle.complete_error(err);
                        }
                        return;
                    }

                    self.emit(
                        job_id,
                        job_type,
                        FrameworkEvent::JobRetrying { attempt: attempt + 1, max: retry_policy.max_retries },
                    );
                    tokio::time::sleep(retry_policy.delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Races `process` against the job's timeout and cancellation token.
    /// Cancellation wins a tie with timeout since it's the stronger signal
    /// (a caller explicitly asked to stop).
    async fn run_once(
        &self,
        job: &J,
        handle: &jobkit_dispatch::JobHandleController<J::Output>,
    ) -> Result<J::Output, EngineError> {
        if let Some(token) = job.cancellation_token() {
            if let Err(e) = token.throw_if_cancelled() {
                return Err(EngineError::Cancelled { reason: e.reason });
            }
        }

        let progress =
            ProgressReporter::new(handle, &self.bus, self.observer.as_ref(), job.id(), job.job_type());
        let process_fut = self.process.process(job, &progress);
        let cancel_fut = match job.cancellation_token() {
            Some(token) => Some(wait_for_cancel(token)),
            None => None,
        };

        match (job.timeout(), cancel_fut) {
            (Some(duration), Some(cancel_fut)) => {
                tokio::select! {
                    res = process_fut => res,
                    _ = tokio::time::sleep(duration) => {
                        Err(EngineError::TimedOut { duration_ms: duration.as_millis() as u64 })
                    }
                    reason = cancel_fut => Err(EngineError::Cancelled { reason }),
                }
            }
            (Some(duration), None) => {
                tokio::select! {
                    res = process_fut => res,
                    _ = tokio::time::sleep(duration) => {
                        Err(EngineError::TimedOut { duration_ms: duration.as_millis() as u64 })
                    }
                }
            }
            (None, Some(cancel_fut)) => {
                tokio::select! {
                    res = process_fut => res,
                    reason = cancel_fut => Err(EngineError::Cancelled { reason }),
                }
            }
            (None, None) => process_fut.await,
        }
    }

    async fn hand_off_to_offline_queue(
        &self,
        job: J,
        job_id: JobId,
        job_type: &'static str,
        optimistic_value: Option<J::Output>,
        handle: jobkit_dispatch::JobHandleController<J::Output>,
    ) {
        let Some(sink) = self.offline_sink.clone() else {
            handle.complete_error(EngineError::EnqueueRejected {
                job_id,
                cause: "no offline sink configured".to_string(),
            });
            return;
        };

        if let Some(value) = optimistic_value {
            self.emit_success(&job, job_id, job_type, &value, DataSource::Optimistic);
            handle.complete(value, DataSource::Optimistic);
        }

        if let Err(err) = sink.enqueue(job, handle).await {
            tracing::warn!(job_id = %job_id, job_type, error = %err, "offline enqueue failed");
        }
    }

    fn write_cache(
        &self,
        job_id: JobId,
        job_type: &'static str,
        cache_key: Option<&str>,
        job: &J,
        value: &J::Output,
    ) {
        let (Some(key), Some(cache)) = (cache_key, self.cache.as_ref()) else {
            return;
        };
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                if let Err(err) = cache.write(key, bytes, job.cache_ttl()) {
                    tracing::warn!(job_id = %job_id, job_type, error = %err, "cache write failed");
                }
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, job_type, error = %err, "cache serialize failed")
            }
        }
    }

    fn emit_success(
        &self,
        job: &J,
        job_id: JobId,
        job_type: &'static str,
        value: &J::Output,
        source: DataSource,
    ) {
        match job.as_event_job() {
            Some(event_job) => {
                let domain_event = event_job.make_event(value);
                let event = Event::domain(job_id, epoch_ms_now(), Some(job_type), domain_event);
                guarded(AssertUnwindSafe(|| self.observer.on_event(&event)));
                self.bus.emit(event);
            }
            None => {
                let data: Arc<dyn std::any::Any + Send + Sync> = Arc::new(value.clone());
                self.emit(job_id, job_type, FrameworkEvent::JobSuccess { data, source });
            }
        }
    }

    fn emit_terminal_error(
        &self,
        job_id: JobId,
        job_type: &'static str,
        err: &EngineError,
        was_retried: bool,
    ) {
        let event = match err {
            EngineError::Cancelled { reason } => {
                FrameworkEvent::JobCancelled { reason: reason.clone() }
            }
            EngineError::TimedOut { duration_ms } => {
                FrameworkEvent::JobTimeout { duration: Duration::from_millis(*duration_ms) }
            }
            other => FrameworkEvent::JobFailure {
                error: other.to_string(),
                stack: None,
                was_retried,
            },
        };
        self.emit(job_id, job_type, event);
    }
}

/// Resolves once `token` fires, yielding its cancellation reason. Leaves the
/// listener registered if the future is dropped before firing (e.g. the
/// other `select!` branch won first); harmless since cancellation tokens
/// are job-scoped and dropped with the job.
async fn wait_for_cancel(token: jobkit_core::cancellation::CancellationToken) -> Option<String> {
    if let Err(e) = token.throw_if_cancelled() {
        return e.reason;
    }
    let (tx, rx) = oneshot::channel::<Option<String>>();
    let tx = parking_lot::Mutex::new(Some(tx));
    let _unregister = token.on_cancel(move || {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(None);
        }
    });
    let fired = rx.await.ok().flatten();
    fired.or_else(|| token.reason())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
