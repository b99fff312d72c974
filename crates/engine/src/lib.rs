// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! jobkit-engine: the `BaseExecutor` lifecycle — cache, process, timeout,
//! cancellation, retry, and event emission — plus the `Process` and
//! `OfflineSink` seams the engine is built against.

pub mod executor;
pub mod offline_sink;
pub mod process;

pub use executor::BaseExecutor;
pub use offline_sink::OfflineSink;
pub use process::{FnProcess, Process, ProgressReporter};
