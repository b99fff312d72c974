// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete ID types used throughout the runtime.

crate::define_id! {
    /// Unique identifier for a dispatched job.
    ///
    /// Stable for the job's lifetime; a retry reuses the same id (a new
    /// logical attempt), a redo re-dispatches with a fresh id.
    pub struct JobId("job-");
}

crate::define_id! {
    /// Unique identifier for an emitted event.
    pub struct EventId("evt-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
