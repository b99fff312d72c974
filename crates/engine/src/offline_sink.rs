// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hand-off point to the offline queue (spec §4.2, "NetworkAction
//! interception"). Defined here rather than depending on `jobkit-offline`
//! directly, so `jobkit-offline` can depend on this crate for the trait
//! without creating a cycle.

use async_trait::async_trait;
use jobkit_core::error::EngineError;
use jobkit_core::job::Job;
use jobkit_dispatch::JobHandleController;

/// Bound to `Job` rather than `NetworkAction` so `BaseExecutor<J, P>` can
/// hold an optional sink for any job type; in practice only job types that
/// also implement `NetworkAction` are ever routed here (see
/// `BaseExecutor::run`'s capability check before `enqueue` is called).
#[async_trait]
pub trait OfflineSink<J: Job>: Send + Sync {
    /// Persist `job` for later replay and take ownership of `controller` so
    /// a later successful drain can complete it (spec invariant 4: at
    /// least once, engine-agnostic across restarts since the handle itself
    /// is in-memory only).
    async fn enqueue(
        &self,
        job: J,
        controller: JobHandleController<J::Output>,
    ) -> Result<(), EngineError>;
}
