use super::*;
use async_trait::async_trait;
use jobkit_core::event::FrameworkEvent;
use jobkit_core::source::DataSource;
use jobkit_core::test_support::TestJob;
use jobkit_dispatch::{Executor, JobHandleController};
use jobkit_storage::queue::{InMemoryNetworkQueueStorage, OfflineQueueEntry, QueueEntryStatus};
use std::collections::HashMap;

struct EchoExecutor;

#[async_trait]
impl Executor<TestJob> for EchoExecutor {
    async fn execute(&self, _job: TestJob, handle: JobHandleController<usize>) {
        handle.complete(7, DataSource::Fresh);
    }
}

fn view(ring_capacity: usize) -> (DiagnosticsView, SignalBus, Arc<InMemoryNetworkQueueStorage>) {
    let bus = SignalBus::new(1000, HashMap::new());
    let registry = Arc::new(DispatcherRegistry::new());
    registry.register::<TestJob, _>(EchoExecutor);
    let storage = Arc::new(InMemoryNetworkQueueStorage::new());
    let diagnostics = DiagnosticsView::new(registry, storage.clone(), &bus, ring_capacity);
    (diagnostics, bus, storage)
}

#[test]
fn registered_executors_mirrors_the_registry_snapshot() {
    let (diagnostics, _bus, _storage) = view(4);
    let snapshot = diagnostics.registered_executors();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.keys().any(|k| k.contains("TestJob")));
}

#[test]
fn offline_queue_snapshot_mirrors_the_storage_backend() {
    let (diagnostics, _bus, storage) = view(4);
    assert_eq!(diagnostics.offline_queue_depth(), 0);

    storage
        .save(OfflineQueueEntry {
            job_id: JobId::new(),
            serialized_payload: Vec::new(),
            retry_count: 0,
            created_at_epoch_ms: 0,
            status: QueueEntryStatus::Pending,
        })
        .unwrap();

    assert_eq!(diagnostics.offline_queue_depth(), 1);
    assert_eq!(diagnostics.offline_queue_snapshot()[0].status, QueueEntryStatus::Pending);
}

#[test]
fn recent_events_evicts_the_oldest_entry_once_capacity_is_exceeded() {
    let (diagnostics, bus, _storage) = view(2);
    for _ in 0..3 {
        bus.emit(Event::framework(JobId::new(), 0, None, FrameworkEvent::JobStarted));
    }
    let recent = diagnostics.recent_events();
    assert_eq!(recent.len(), 2);
}

#[test]
fn dispose_stops_accumulating_further_events() {
    let (diagnostics, bus, _storage) = view(4);
    bus.emit(Event::framework(JobId::new(), 0, None, FrameworkEvent::JobStarted));
    diagnostics.dispose();
    bus.emit(Event::framework(JobId::new(), 0, None, FrameworkEvent::JobStarted));
    assert_eq!(diagnostics.recent_events().len(), 1);
}
