use super::*;
use crate::process::ProgressReporter;
use jobkit_bus::SignalBus;
use jobkit_core::observer::NoopObserver;
use jobkit_core::retry::RetryPolicy;
use jobkit_core::test_support::TestJob;
use jobkit_core::CancellationToken;
use jobkit_dispatch::{Executor, JobHandle};
use jobkit_storage::cache::InMemoryCacheProvider;
use jobkit_storage::connectivity::InMemoryConnectivityProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn bus() -> SignalBus {
    SignalBus::new(1000, HashMap::new())
}

fn dispatch<P: Process<TestJob>>(executor: BaseExecutor<TestJob, P>, job: TestJob) -> JobHandle<usize> {
    let (handle, controller) = JobHandle::pair(job.id());
    tokio::spawn(async move { executor.execute(job, controller).await });
    handle
}

#[tokio::test]
async fn cache_miss_runs_process_and_completes_fresh() {
    let executor = BaseExecutor::new(FnProcess(|_job: &TestJob, _progress: &ProgressReporter<'_, _>| async { Ok(7) }), bus());
    let handle = dispatch(executor, TestJob::new());
    let result = handle.result().await.unwrap();
    assert_eq!(result.data, 7);
    assert_eq!(result.source, jobkit_core::DataSource::Fresh);
}

#[tokio::test]
async fn cache_hit_short_circuits_process() {
    let cache = std::sync::Arc::new(InMemoryCacheProvider::new());
    cache.write("k", serde_json::to_vec(&99usize).unwrap(), None).unwrap();
    let calls = std::sync::Arc::new(AtomicUsize::new(0));
    let calls2 = calls.clone();
    let executor = BaseExecutor::new(
        FnProcess(move |_job: &TestJob, _progress: &ProgressReporter<'_, _>| {
            calls2.fetch_add(1, Ordering::SeqCst);
            async { Ok(1) }
        }),
        bus(),
    )
    .with_cache(cache);

    let job = TestJob::new().with_cache_key("k");
    let handle = dispatch(executor, job);
    let result = handle.result().await.unwrap();
    assert_eq!(result.data, 99);
    assert_eq!(result.source, jobkit_core::DataSource::Cached);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cache_hit_with_revalidate_still_refreshes_cache_without_reopening_handle() {
    let cache = std::sync::Arc::new(InMemoryCacheProvider::new());
    cache.write("k", serde_json::to_vec(&1usize).unwrap(), None).unwrap();
    let executor =
        BaseExecutor::new(FnProcess(|_job: &TestJob, _progress: &ProgressReporter<'_, _>| async { Ok(2) }), bus()).with_cache(cache.clone());

    let job = TestJob::new().with_cache_key("k").with_revalidate(true);
    let handle = dispatch(executor, job);
    let result = handle.result().await.unwrap();
    // Handle resolves with the cached value even though revalidation ran.
    assert_eq!(result.data, 1);
    assert_eq!(result.source, jobkit_core::DataSource::Cached);

    // Give the background revalidation a tick to land.
    tokio::task::yield_now().await;
    let refreshed: usize = serde_json::from_slice(&cache.read("k").unwrap().unwrap().value).unwrap();
    assert_eq!(refreshed, 2);
}

#[tokio::test(start_paused = true)]
async fn retries_until_policy_exhausted_then_fails() {
    let attempts = std::sync::Arc::new(AtomicUsize::new(0));
    let attempts2 = attempts.clone();
    let policy = RetryPolicy::new(2, Duration::from_millis(10));
    let executor = BaseExecutor::new(
        FnProcess(move |_job: &TestJob, _progress: &ProgressReporter<'_, _>| {
            attempts2.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::ProcessFailure { cause: "boom".into(), stack: None, was_retried: false }) }
        }),
        bus(),
    );
    let job = TestJob::new().with_retry_policy(policy);
    let handle = dispatch(executor, job);
    let result = handle.result().await;
    assert!(result.is_err());
    // Initial attempt plus two retries.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn retries_then_succeeds() {
    let attempts = std::sync::Arc::new(AtomicUsize::new(0));
    let attempts2 = attempts.clone();
    let policy = RetryPolicy::new(5, Duration::from_millis(10));
    let executor = BaseExecutor::new(
        FnProcess(move |_job: &TestJob, _progress: &ProgressReporter<'_, _>| {
            let n = attempts2.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(EngineError::ProcessFailure { cause: "boom".into(), stack: None, was_retried: false })
                } else {
                    Ok(5)
                }
            }
        }),
        bus(),
    );
    let job = TestJob::new().with_retry_policy(policy);
    let handle = dispatch(executor, job);
    let result = handle.result().await.unwrap();
    assert_eq!(result.data, 5);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn timeout_beats_a_slow_process_and_is_not_retried() {
    let attempts = std::sync::Arc::new(AtomicUsize::new(0));
    let attempts2 = attempts.clone();
    let executor = BaseExecutor::new(
        FnProcess(move |_job: &TestJob, _progress: &ProgressReporter<'_, _>| {
            attempts2.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(1)
            }
        }),
        bus(),
    );
    let job = TestJob::new()
        .with_timeout(Duration::from_millis(50))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)));
    let handle = dispatch(executor, job);
    let result = handle.result().await;
    assert!(matches!(result, Err(EngineError::TimedOut { .. })));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_wins_and_is_not_retried() {
    let token = CancellationToken::new();
    let token2 = token.clone();
    let executor = BaseExecutor::new(
        FnProcess(move |_job: &TestJob, _progress: &ProgressReporter<'_, _>| {
            let token = token2.clone();
            async move {
                token.cancel(Some("user requested".to_string()));
                std::future::pending::<()>().await;
                Ok(1)
            }
        }),
        bus(),
    );
    let job = TestJob::new()
        .with_cancellation_token(token)
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)));
    let handle = dispatch(executor, job);
    let result = handle.result().await;
    match result {
        Err(EngineError::Cancelled { reason }) => assert_eq!(reason.as_deref(), Some("user requested")),
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

struct RecordingOfflineSink {
    enqueued: std::sync::Mutex<Vec<JobId>>,
}

#[async_trait::async_trait]
impl OfflineSink<TestJob> for RecordingOfflineSink {
    async fn enqueue(
        &self,
        job: TestJob,
        controller: jobkit_dispatch::JobHandleController<usize>,
    ) -> Result<(), EngineError> {
        self.enqueued.lock().unwrap().push(job.id());
        drop(controller);
        Ok(())
    }
}

#[tokio::test]
async fn network_action_offline_hands_off_to_sink_with_optimistic_completion() {
    let connectivity = std::sync::Arc::new(InMemoryConnectivityProvider::new(false));
    let sink = std::sync::Arc::new(RecordingOfflineSink { enqueued: std::sync::Mutex::new(Vec::new()) });
    let executor = BaseExecutor::new(FnProcess(|_job: &TestJob, _progress: &ProgressReporter<'_, _>| async { Ok(1) }), bus())
        .with_connectivity(connectivity)
        .with_offline_sink(sink.clone());

    let job = TestJob::new();
    let job_id = job.id();
    let handle = dispatch(executor, job);
    // TestJob's NetworkAction impl has no optimistic value, so the handle
    // is left for the sink to complete; here the sink just drops its
    // controller, which resolves the handle as cancelled rather than
    // hanging forever.
    let result = handle.result().await;
    assert!(matches!(result, Err(EngineError::Cancelled { .. })));
    assert_eq!(sink.enqueued.lock().unwrap().as_slice(), [job_id]);
}

#[tokio::test]
async fn network_action_offline_without_sink_rejects_enqueue() {
    let connectivity = std::sync::Arc::new(InMemoryConnectivityProvider::new(false));
    let executor = BaseExecutor::new(FnProcess(|_job: &TestJob, _progress: &ProgressReporter<'_, _>| async { Ok(1) }), bus())
        .with_connectivity(connectivity);
    let handle = dispatch(executor, TestJob::new());
    let result = handle.result().await;
    assert!(matches!(result, Err(EngineError::EnqueueRejected { .. })));
}

#[tokio::test]
async fn observer_is_never_skipped_even_when_it_panics() {
    struct PanickyObserver;
    impl jobkit_core::Observer for PanickyObserver {
        fn on_job_start(&self, _job_id: JobId, _job_type: &'static str) {
            panic!("observer exploded");
        }
    }
    let _ = NoopObserver;
    let executor = BaseExecutor::new(FnProcess(|_job: &TestJob, _progress: &ProgressReporter<'_, _>| async { Ok(1) }), bus())
        .with_observer(std::sync::Arc::new(PanickyObserver));
    let handle = dispatch(executor, TestJob::new());
    let result = handle.result().await.unwrap();
    assert_eq!(result.data, 1);
}
