// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provenance tag on a job result.

use serde::{Deserialize, Serialize};

/// Provenance of a [`crate::job::JobResult`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Just computed by `process`.
    Fresh,
    /// Served from the cache without running `process`.
    Cached,
    /// Placeholder value, to be replaced once the real result is known
    /// (used for offline NetworkAction jobs with an optimistic value).
    Optimistic,
}

crate::simple_display! {
    DataSource {
        Fresh => "fresh",
        Cached => "cached",
        Optimistic => "optimistic",
    }
}
