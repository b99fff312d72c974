// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform delegate for jobs that reference ephemeral files (spec §4.5,
//! "File/IO safety").

use jobkit_core::ids::JobId;

/// Rewrites a job's ephemeral file references into a controlled directory
/// before it's persisted, and cleans the copies up once the queue entry is
/// removed or poisoned. A no-op default (no delegate configured) is simply
/// `None` on [`crate::manager::OfflineQueueManager`] — most job types don't
/// reference files at all.
pub trait FileSafetyDelegate<J>: Send + Sync {
    /// Copy any file paths `job` references into the controlled directory
    /// and return a job pointing at the copies.
    fn protect(&self, job: J) -> J;

    /// Remove the safe copies made for the entry that was persisted under
    /// `job_id`.
    fn cleanup(&self, job_id: JobId);
}
