// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable map of queued offline jobs (spec §6, "Network queue storage").

use crate::error::StorageError;
use indexmap::IndexMap;
use jobkit_core::ids::JobId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEntryStatus {
    Pending,
    Processing,
    Poisoned,
}

/// `(job_id, serialized_payload, retry_count, created_at, status)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineQueueEntry {
    pub job_id: JobId,
    pub serialized_payload: Vec<u8>,
    pub retry_count: u32,
    pub created_at_epoch_ms: u64,
    pub status: QueueEntryStatus,
}

/// Partial update applied by [`NetworkQueueStorage::update`]; unset fields
/// leave the stored entry unchanged, mirroring `jobkit_core::config`'s
/// builder-merge convention.
#[derive(Debug, Clone, Default)]
pub struct QueueEntryPatch {
    pub retry_count: Option<u32>,
    pub status: Option<QueueEntryStatus>,
}

impl QueueEntryPatch {
    jobkit_core::setters! {
        option { retry_count: u32, status: QueueEntryStatus }
    }
}

pub trait NetworkQueueStorage: Send + Sync {
    fn save(&self, entry: OfflineQueueEntry) -> Result<(), StorageError>;
    fn get(&self, job_id: &JobId) -> Result<Option<OfflineQueueEntry>, StorageError>;
    /// Entries in insertion order, per the drain contract (spec §4.5).
    fn get_all(&self) -> Result<Vec<OfflineQueueEntry>, StorageError>;
    fn update(&self, job_id: &JobId, patch: QueueEntryPatch) -> Result<(), StorageError>;
    fn remove(&self, job_id: &JobId) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct InMemoryNetworkQueueStorage {
    entries: Mutex<IndexMap<JobId, OfflineQueueEntry>>,
}

impl InMemoryNetworkQueueStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NetworkQueueStorage for InMemoryNetworkQueueStorage {
    fn save(&self, entry: OfflineQueueEntry) -> Result<(), StorageError> {
        self.entries.lock().insert(entry.job_id, entry);
        Ok(())
    }

    fn get(&self, job_id: &JobId) -> Result<Option<OfflineQueueEntry>, StorageError> {
        Ok(self.entries.lock().get(job_id).cloned())
    }

    fn get_all(&self) -> Result<Vec<OfflineQueueEntry>, StorageError> {
        Ok(self.entries.lock().values().cloned().collect())
    }

    fn update(&self, job_id: &JobId, patch: QueueEntryPatch) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let entry =
            entries.get_mut(job_id).ok_or(StorageError::NotFound { job_id: *job_id })?;
        if let Some(retry_count) = patch.retry_count {
            entry.retry_count = retry_count;
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        Ok(())
    }

    fn remove(&self, job_id: &JobId) -> Result<(), StorageError> {
        self.entries.lock().shift_remove(job_id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(job_id: JobId) -> OfflineQueueEntry {
        OfflineQueueEntry {
            job_id,
            serialized_payload: vec![1, 2, 3],
            retry_count: 0,
            created_at_epoch_ms: 0,
            status: QueueEntryStatus::Pending,
        }
    }

    #[test]
    fn save_then_get_round_trips() {
        let storage = InMemoryNetworkQueueStorage::new();
        let job_id = JobId::new();
        storage.save(entry(job_id)).unwrap();
        assert_eq!(storage.get(&job_id).unwrap().unwrap().job_id, job_id);
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let storage = InMemoryNetworkQueueStorage::new();
        let ids: Vec<JobId> = (0..5).map(|_| JobId::new()).collect();
        for id in &ids {
            storage.save(entry(*id)).unwrap();
        }
        let all = storage.get_all().unwrap();
        let observed: Vec<JobId> = all.iter().map(|e| e.job_id).collect();
        assert_eq!(observed, ids);
    }

    #[test]
    fn update_merges_only_set_fields() {
        let storage = InMemoryNetworkQueueStorage::new();
        let job_id = JobId::new();
        storage.save(entry(job_id)).unwrap();
        storage.update(&job_id, QueueEntryPatch::default().retry_count(3)).unwrap();
        let updated = storage.get(&job_id).unwrap().unwrap();
        assert_eq!(updated.retry_count, 3);
        assert_eq!(updated.status, QueueEntryStatus::Pending);
    }

    #[test]
    fn update_missing_entry_errors() {
        let storage = InMemoryNetworkQueueStorage::new();
        let result = storage.update(&JobId::new(), QueueEntryPatch::default());
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn remove_drops_the_entry() {
        let storage = InMemoryNetworkQueueStorage::new();
        let job_id = JobId::new();
        storage.save(entry(job_id)).unwrap();
        storage.remove(&job_id).unwrap();
        assert!(storage.get(&job_id).unwrap().is_none());
    }
}
