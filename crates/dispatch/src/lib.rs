// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! jobkit-dispatch: typed executor registry, routing, and `JobHandle`.

pub mod executor;
pub mod handle;
pub mod registry;

pub use executor::Executor;
pub use handle::{JobHandle, JobHandleController, DEFAULT_PROGRESS_BUFFER};
pub use registry::DispatcherRegistry;
