// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer error kinds.

use jobkit_core::ids::JobId;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("no queue entry for job {job_id}")]
    NotFound { job_id: JobId },

    #[error("storage I/O error: {0}")]
    Io(String),
}
