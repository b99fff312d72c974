// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The object-safe contract a registered executor fulfils for a job type.

use crate::handle::JobHandleController;
use async_trait::async_trait;
use jobkit_core::job::Job;

/// Drives a `J` through its full lifecycle (cache, process, timeout, retry,
/// event emission) and completes `handle` exactly once. `jobkit-engine`'s
/// `BaseExecutor<J, P>` is the framework's implementation of this trait;
/// anything implementing it can be registered with a
/// [`crate::registry::DispatcherRegistry`].
#[async_trait]
pub trait Executor<J: Job>: Send + Sync {
    async fn execute(&self, job: J, handle: JobHandleController<J::Output>);
}
