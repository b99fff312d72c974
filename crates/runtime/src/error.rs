// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors local to the undo/redo machinery. Dispatch failures are
//! propagated from [`jobkit_core::error::EngineError`] rather than
//! re-wrapped field-by-field.

use jobkit_core::error::EngineError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UndoError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("undo cancelled by on_before_undo hook")]
    CancelledByHook,

    #[error("undo dispatch failed: {0}")]
    DispatchFailed(#[from] EngineError),
}
