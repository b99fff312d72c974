// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `OfflineQueueManager`: durable queue of `NetworkAction` jobs with
//! poison-pill handling (spec §4.5).

use crate::file_safety::FileSafetyDelegate;
use async_trait::async_trait;
use jobkit_bus::SignalBus;
use jobkit_core::clock::epoch_ms_now;
use jobkit_core::error::EngineError;
use jobkit_core::event::{Event, FrameworkEvent};
use jobkit_core::ids::JobId;
use jobkit_core::job::{Job, NetworkAction};
use jobkit_dispatch::{DispatcherRegistry, JobHandleController};
use jobkit_engine::OfflineSink;
use jobkit_storage::connectivity::ConnectivityProvider;
use jobkit_storage::queue::{NetworkQueueStorage, OfflineQueueEntry, QueueEntryPatch, QueueEntryStatus};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Persists `NetworkAction` jobs of a single type `J` and replays them once
/// connectivity returns. One manager instance per `NetworkAction` job type
/// (mirroring `DispatcherRegistry`'s per-type executor registration) rather
/// than a single manager multiplexing every job type through an erased
/// payload — keeps (de)serialization fully typed instead of routing through
/// a second type registry.
pub struct OfflineQueueManager<J: Job> {
    storage: Arc<dyn NetworkQueueStorage>,
    bus: SignalBus,
    dispatcher: Arc<DispatcherRegistry>,
    max_retries: u32,
    file_safety: Option<Arc<dyn FileSafetyDelegate<J>>>,
    pending_controllers: Mutex<HashMap<JobId, JobHandleController<J::Output>>>,
    draining: AtomicBool,
}

impl<J: Job> OfflineQueueManager<J> {
    pub fn new(
        storage: Arc<dyn NetworkQueueStorage>,
        bus: SignalBus,
        dispatcher: Arc<DispatcherRegistry>,
        max_retries: u32,
    ) -> Self {
        Self {
            storage,
            bus,
            dispatcher,
            max_retries,
            file_safety: None,
            pending_controllers: Mutex::new(HashMap::new()),
            draining: AtomicBool::new(false),
        }
    }

    pub fn with_file_safety(mut self, delegate: Arc<dyn FileSafetyDelegate<J>>) -> Self {
        self.file_safety = Some(delegate);
        self
    }

    /// Spawns a background task that drains whenever `connectivity`
    /// transitions to connected. Dropping the returned `JoinHandle`'s
    /// abort handle (or the manager itself, if it's the only strong
    /// reference) stops the watch.
    pub fn spawn_auto_drain(
        self: Arc<Self>,
        connectivity: Arc<dyn ConnectivityProvider>,
    ) -> tokio::task::JoinHandle<()>
    where
        J: NetworkAction + Serialize + DeserializeOwned,
    {
        let mut changes = connectivity.on_change();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                if *changes.borrow() {
                    self.drain().await;
                }
            }
        })
    }
}

impl<J> OfflineQueueManager<J>
where
    J: Job + NetworkAction + Serialize + DeserializeOwned,
{
    /// Drains pending entries in insertion order. Returns the number
    /// successfully replayed. A drain already in flight makes this call a
    /// no-op (spec: "only one drain runs concurrently").
    pub async fn drain(&self) -> usize {
        if self.draining.swap(true, Ordering::SeqCst) {
            tracing::debug!("drain already in progress, skipping");
            return 0;
        }
        let processed = self.drain_inner().await;
        self.draining.store(false, Ordering::SeqCst);
        processed
    }

    async fn drain_inner(&self) -> usize {
        let entries = match self.storage.get_all() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "drain: failed to read offline queue");
                return 0;
            }
        };

        let mut processed = 0;
        for entry in entries.into_iter().filter(|e| e.status == QueueEntryStatus::Pending) {
            if self.drain_one(entry).await {
                processed += 1;
            }
        }
        processed
    }

    async fn drain_one(&self, entry: OfflineQueueEntry) -> bool {
        let job_id = entry.job_id;
        if let Err(err) = self
            .storage
            .update(&job_id, QueueEntryPatch::default().status(QueueEntryStatus::Processing))
        {
            tracing::warn!(job_id = %job_id, error = %err, "drain: failed to mark entry processing");
            return false;
        }

        let job: J = match serde_json::from_slice(&entry.serialized_payload) {
            Ok(job) => job,
            Err(err) => {
                self.poison(job_id, entry.retry_count, format!("deserialize failed: {err}"));
                return false;
            }
        };

        let handle = self.dispatcher.dispatch(job);
        match handle.result().await {
            Ok(result) => {
                let _ = self.storage.remove(&job_id);
                if let Some(delegate) = &self.file_safety {
                    delegate.cleanup(job_id);
                }
                if let Some(controller) = self.pending_controllers.lock().remove(&job_id) {
                    controller.complete(result.data, result.source);
                }
                true
            }
            Err(err) => {
                self.fail_entry(job_id, entry.retry_count, err);
                false
            }
        }
    }

    fn fail_entry(&self, job_id: JobId, retry_count: u32, err: EngineError) {
        let next_retry_count = retry_count + 1;
        if next_retry_count >= self.max_retries {
            self.poison(job_id, next_retry_count, err.to_string());
            return;
        }
        if let Err(update_err) = self.storage.update(
            &job_id,
            QueueEntryPatch::default().retry_count(next_retry_count).status(QueueEntryStatus::Pending),
        ) {
            tracing::warn!(job_id = %job_id, error = %update_err, "drain: failed to record retry");
        }
    }

    fn poison(&self, job_id: JobId, retry_count: u32, reason: String) {
        if let Err(err) = self.storage.update(
            &job_id,
            QueueEntryPatch::default().retry_count(retry_count).status(QueueEntryStatus::Poisoned),
        ) {
            tracing::warn!(job_id = %job_id, error = %err, "drain: failed to mark entry poisoned");
        }
        if let Some(delegate) = &self.file_safety {
            delegate.cleanup(job_id);
        }
        if let Some(controller) = self.pending_controllers.lock().remove(&job_id) {
            controller.complete_error(EngineError::Poisoned { job_id, last_cause: reason.clone() });
        }
        self.bus.emit(Event::framework(
            job_id,
            epoch_ms_now(),
            None,
            FrameworkEvent::NetworkSyncFailure { job_id, reason },
        ));
    }
}

#[async_trait]
impl<J> OfflineSink<J> for OfflineQueueManager<J>
where
    J: Job + NetworkAction + Serialize + DeserializeOwned,
{
    async fn enqueue(
        &self,
        job: J,
        controller: JobHandleController<J::Output>,
    ) -> Result<(), EngineError> {
        let job_id = job.id();
        let job = match &self.file_safety {
            Some(delegate) => delegate.protect(job),
            None => job,
        };

        let payload = serde_json::to_vec(&job)
            .map_err(|err| EngineError::EnqueueRejected { job_id, cause: err.to_string() })?;
        let entry = OfflineQueueEntry {
            job_id,
            serialized_payload: payload,
            retry_count: 0,
            created_at_epoch_ms: epoch_ms_now(),
            status: QueueEntryStatus::Pending,
        };
        self.storage
            .save(entry)
            .map_err(|err| EngineError::EnqueueRejected { job_id, cause: err.to_string() })?;

        self.pending_controllers.lock().insert(job_id, controller);
        Ok(())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
