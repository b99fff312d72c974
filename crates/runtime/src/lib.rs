// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! jobkit-runtime: the reactive-container `Orchestrator<S>` (§4.6), the
//! cross-operation `UndoStackManager` (§4.7), the intra-operation
//! `SagaFlow` (§4.8), and the `DiagnosticsView` read-only snapshot
//! (`SPEC_FULL.md` §2).

pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod saga;
pub mod undo;

pub use diagnostics::{DiagnosticsView, RecentEvent};
pub use error::UndoError;
pub use orchestrator::{FnReducer, Orchestrator, Reducer, ACTIVE_JOB_GRACE};
pub use saga::SagaFlow;
pub use undo::{NoopUndoHooks, UndoEntry, UndoHooks, UndoStackManager, UndoToResult, UndoToStrategy};
