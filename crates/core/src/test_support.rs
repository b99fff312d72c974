// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures, exported behind `test-support` so downstream
//! crates (`jobkit-dispatch`, `jobkit-engine`, ...) can build their own
//! test suites on the same job/observer doubles instead of redefining them.

use crate::cancellation::CancellationToken;
use crate::event::{DomainEvent, Event};
use crate::error::EngineError;
use crate::ids::JobId;
use crate::job::{EventJob, Job, NetworkAction, ReversibleJob};
use crate::observer::Observer;
use crate::retry::RetryPolicy;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// A minimal job usable by any crate's tests without redefining a fixture
/// type per test module.
#[derive(Clone)]
pub struct TestJob {
    pub id: JobId,
    pub cache_key: Option<String>,
    pub timeout: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
    pub cancellation_token: Option<CancellationToken>,
    pub revalidate: bool,
}

impl TestJob {
    pub fn new() -> Self {
        Self {
            id: JobId::new(),
            cache_key: None,
            timeout: None,
            retry_policy: None,
            cancellation_token: None,
            revalidate: false,
        }
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn with_revalidate(mut self, revalidate: bool) -> Self {
        self.revalidate = revalidate;
        self
    }
}

impl Default for TestJob {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TestEvent(pub usize);

impl DomainEvent for TestEvent {
    fn event_name(&self) -> &'static str {
        "test:event"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Job for TestJob {
    type Output = usize;

    fn id(&self) -> JobId {
        self.id
    }

    fn job_type(&self) -> &'static str {
        "TestJob"
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn cancellation_token(&self) -> Option<CancellationToken> {
        self.cancellation_token.clone()
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry_policy
    }

    fn cache_key(&self) -> Option<String> {
        self.cache_key.clone()
    }

    fn revalidate(&self) -> bool {
        self.revalidate
    }

    fn as_event_job(&self) -> Option<&dyn EventJob<Output = usize>> {
        Some(self)
    }

    fn as_network_action(&self) -> Option<&dyn NetworkAction<Output = usize>> {
        Some(self)
    }

    fn as_reversible(&self) -> Option<&dyn ReversibleJob<Output = usize>> {
        Some(self)
    }
}

impl EventJob for TestJob {
    fn make_event(&self, result: &usize) -> Box<dyn DomainEvent> {
        Box::new(TestEvent(*result))
    }
}

impl NetworkAction for TestJob {}

impl ReversibleJob for TestJob {
    fn make_inverse(&self, _result: &usize) -> Box<dyn Job<Output = usize>> {
        Box::new(TestJob::new())
    }

    fn description(&self) -> Option<String> {
        Some("test job".to_string())
    }
}

/// An [`Observer`] that records every callback for assertion, guarded by a
/// mutex rather than atomics since tests care about call order, not just
/// counts.
#[derive(Default, Clone)]
pub struct RecordingObserver {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Observer for RecordingObserver {
    fn on_job_start(&self, job_id: JobId, job_type: &'static str) {
        self.calls.lock().push(format!("start:{job_type}:{job_id}"));
    }

    fn on_job_success(&self, job_id: JobId, job_type: &'static str) {
        self.calls.lock().push(format!("success:{job_type}:{job_id}"));
    }

    fn on_job_error(&self, job_id: JobId, job_type: &'static str, error: &EngineError) {
        self.calls.lock().push(format!("error:{job_type}:{job_id}:{error}"));
    }

    fn on_event(&self, event: &Event) {
        self.calls.lock().push(format!("event:{}", event.type_name()));
    }
}

/// A [`proptest`](https://docs.rs/proptest) strategy generating arbitrary
/// (but well-formed) [`RetryPolicy`] values, for downstream crates'
/// property tests over retry/backoff behavior without redefining the
/// generator per crate.
#[cfg(feature = "proptest")]
pub fn arb_retry_policy() -> impl proptest::strategy::Strategy<Value = RetryPolicy> {
    use proptest::prelude::*;
    (1u64..1000, 1u64..100_000, 0u32..20, any::<bool>()).prop_map(
        |(base_ms, max_ms, max_retries, exponential)| {
            let mut policy = RetryPolicy::new(max_retries, Duration::from_millis(base_ms));
            policy.max_delay = Duration::from_millis(max_ms);
            policy.exponential = exponential;
            policy
        },
    )
}
