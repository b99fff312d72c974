// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Type-keyed executor registry and job routing (spec §4.1).
//!
//! Registration is keyed by the Rust type of the job `J`, not by a
//! closed tag, so third-party job types route without the registry
//! knowing about them ahead of time — the same "open capability" spirit
//! as `jobkit_core::job`'s `Option<&dyn Trait>` accessors, applied to
//! routing instead of job capabilities.

use crate::executor::Executor;
use crate::handle::{JobHandle, JobHandleController};
use jobkit_core::error::EngineError;
use jobkit_core::job::Job;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type AnyExecutor = Box<dyn Any + Send + Sync>;
type AnyJob = Box<dyn Any + Send + Sync>;
type AnyController = Box<dyn Any + Send + Sync>;
type BoxedDispatchFn = Arc<dyn Fn(AnyJob, AnyController) + Send + Sync>;

struct Registration {
    job_type_name: &'static str,
    executor_type_name: &'static str,
    executor: AnyExecutor,
    /// Runs a job whose concrete type has already been erased to
    /// `Box<dyn Job<Output = O>>` (e.g. a `ReversibleJob::make_inverse`
    /// result). Captured at [`DispatcherRegistry::register`] time, where
    /// `J` is still a concrete type, so [`DispatcherRegistry::dispatch_boxed`]
    /// never needs to name it.
    dispatch_boxed: BoxedDispatchFn,
}

/// Process-wide by default; construct additional instances for scoped
/// (e.g. per-test) registries.
#[derive(Default)]
pub struct DispatcherRegistry {
    executors: RwLock<HashMap<TypeId, Registration>>,
}

impl DispatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `executor` keyed by job type `J`, overwriting any previous
    /// registration for that type.
    pub fn register<J, E>(&self, executor: E)
    where
        J: Job,
        E: Executor<J> + 'static,
    {
        let erased: Arc<dyn Executor<J>> = Arc::new(executor);
        let for_boxed = erased.clone();
        let dispatch_boxed: BoxedDispatchFn = Arc::new(move |job_any, controller_any| {
            let job = *job_any
                .downcast::<J>()
                .unwrap_or_else(|_| unreachable!("dispatch_boxed: TypeId matched registration"));
            let controller = *controller_any
                .downcast::<JobHandleController<J::Output>>()
                .unwrap_or_else(|_| unreachable!("dispatch_boxed: TypeId matched registration"));
            let executor = for_boxed.clone();
            tokio::spawn(async move {
                executor.execute(job, controller).await;
            });
        });
        let registration = Registration {
            job_type_name: std::any::type_name::<J>(),
            executor_type_name: std::any::type_name::<E>(),
            executor: Box::new(erased),
            dispatch_boxed,
        };
        self.executors.write().insert(TypeId::of::<J>(), registration);
    }

    /// Route `job` to its registered executor and spawn its execution,
    /// returning the handle immediately. If no executor is registered,
    /// the handle completes synchronously with `NoExecutor`.
    pub fn dispatch<J: Job>(&self, job: J) -> JobHandle<J::Output> {
        let (handle, controller) = JobHandle::pair(job.id());

        let executor = {
            let executors = self.executors.read();
            executors
                .get(&TypeId::of::<J>())
                .and_then(|reg| reg.executor.downcast_ref::<Arc<dyn Executor<J>>>())
                .cloned()
        };

        match executor {
            Some(executor) => {
                tokio::spawn(async move {
                    executor.execute(job, controller).await;
                });
            }
            None => {
                tracing::warn!(job_type = job.job_type(), "no executor registered");
                controller.complete_error(EngineError::NoExecutor { job_type: job.job_type() });
            }
        }

        handle
    }

    /// Like [`DispatcherRegistry::dispatch`], but for a job already erased
    /// to `Box<dyn Job<Output = O>>` (e.g. a [`ReversibleJob`][rj]'s boxed
    /// inverse). Routes by the concrete type's `TypeId`, recovered via
    /// [`jobkit_core::job::Job::as_any`], rather than a caller-known static
    /// type.
    ///
    /// [rj]: jobkit_core::job::ReversibleJob
    pub fn dispatch_boxed<O: Send + Sync + 'static>(
        &self,
        job: Box<dyn Job<Output = O>>,
    ) -> JobHandle<O> {
        let job_id = job.id();
        let job_type = job.job_type();
        let type_id = job.as_any().type_id();
        let dispatch_fn = {
            let executors = self.executors.read();
            executors.get(&type_id).map(|reg| reg.dispatch_boxed.clone())
        };

        let (handle, controller) = JobHandle::pair(job_id);
        match dispatch_fn {
            Some(f) => {
                let job_any: Box<dyn Any + Send + Sync> = job.into_any();
                let controller_any: Box<dyn Any + Send + Sync> = Box::new(controller);
                f(job_any, controller_any);
            }
            None => {
                tracing::warn!(job_type, "no executor registered (boxed dispatch)");
                controller.complete_error(EngineError::NoExecutor { job_type });
            }
        }
        handle
    }

    pub fn clear(&self) {
        self.executors.write().clear();
    }

    /// Immutable `{job_type_name -> executor_type_name}` snapshot for
    /// diagnostics.
    pub fn registered_executors(&self) -> HashMap<&'static str, &'static str> {
        self.executors
            .read()
            .values()
            .map(|reg| (reg.job_type_name, reg.executor_type_name))
            .collect()
    }

    pub fn is_registered<J: Job>(&self) -> bool {
        self.executors.read().contains_key(&TypeId::of::<J>())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
