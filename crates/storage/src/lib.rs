// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! jobkit-storage: pluggable stores for cache, connectivity, and the
//! offline job queue (spec §6, "External Interfaces").

pub mod cache;
pub mod connectivity;
pub mod error;
pub mod queue;

pub use cache::{CacheEntry, CacheProvider, InMemoryCacheProvider};
pub use connectivity::{ConnectivityProvider, InMemoryConnectivityProvider};
pub use error::StorageError;
pub use queue::{
    InMemoryNetworkQueueStorage, NetworkQueueStorage, OfflineQueueEntry, QueueEntryPatch,
    QueueEntryStatus,
};
