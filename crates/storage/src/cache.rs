// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key→value cache with optional TTL (spec §6, "Cache provider").

use crate::error::StorageError;
use jobkit_core::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// A cached value plus housekeeping. Values are opaque bytes to the core;
/// the engine owns serializing its job outputs into them.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub expires_at_epoch_ms: Option<u64>,
}

pub trait CacheProvider: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<CacheEntry>, StorageError>;
    fn write(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
    fn delete_matching(&self, predicate: &dyn Fn(&str) -> bool) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Process-local cache backed by a `HashMap`. TTL is enforced lazily on
/// read, per the spec's "TTL handling is the provider's responsibility".
pub struct InMemoryCacheProvider<C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: C,
}

impl InMemoryCacheProvider<SystemClock> {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock: SystemClock }
    }
}

impl<C: Clock> InMemoryCacheProvider<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock }
    }
}

impl Default for InMemoryCacheProvider<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CacheProvider for InMemoryCacheProvider<C> {
    fn read(&self, key: &str) -> Result<Option<CacheEntry>, StorageError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry)
                if entry.expires_at_epoch_ms.is_some_and(|exp| self.clock.epoch_ms() >= exp) =>
            {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StorageError> {
        let expires_at_epoch_ms = ttl.map(|d| self.clock.epoch_ms() + d.as_millis() as u64);
        self.entries.lock().insert(key.to_string(), CacheEntry { value, expires_at_epoch_ms });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn delete_matching(&self, predicate: &dyn Fn(&str) -> bool) -> Result<(), StorageError> {
        self.entries.lock().retain(|k, _| !predicate(k));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobkit_core::clock::FakeClock;

    #[test]
    fn write_then_read_round_trips() {
        let cache = InMemoryCacheProvider::new();
        cache.write("k", b"v".to_vec(), None).unwrap();
        let entry = cache.read("k").unwrap().unwrap();
        assert_eq!(entry.value, b"v");
    }

    #[test]
    fn missing_key_reads_none() {
        let cache = InMemoryCacheProvider::new();
        assert!(cache.read("missing").unwrap().is_none());
    }

    #[test]
    fn ttl_expiry_removes_entry_on_read() {
        let clock = FakeClock::new();
        let cache = InMemoryCacheProvider::with_clock(clock.clone());
        cache.write("k", b"v".to_vec(), Some(Duration::from_millis(100))).unwrap();
        assert!(cache.read("k").unwrap().is_some());
        clock.advance(Duration::from_millis(101));
        assert!(cache.read("k").unwrap().is_none());
        // Expired entry was actually evicted, not just hidden.
        assert!(cache.read("k").unwrap().is_none());
    }

    #[test]
    fn delete_matching_removes_by_predicate() {
        let cache = InMemoryCacheProvider::new();
        cache.write("user:1", b"a".to_vec(), None).unwrap();
        cache.write("user:2", b"b".to_vec(), None).unwrap();
        cache.write("post:1", b"c".to_vec(), None).unwrap();
        cache.delete_matching(&|k| k.starts_with("user:")).unwrap();
        assert!(cache.read("user:1").unwrap().is_none());
        assert!(cache.read("post:1").unwrap().is_some());
    }

    #[test]
    fn clear_removes_everything() {
        let cache = InMemoryCacheProvider::new();
        cache.write("k", b"v".to_vec(), None).unwrap();
        cache.clear().unwrap();
        assert!(cache.read("k").unwrap().is_none());
    }
}
