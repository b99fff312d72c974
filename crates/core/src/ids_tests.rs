// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn job_id_has_stable_prefix() {
    let id = JobId::new();
    assert!(id.as_str().starts_with("job-"));
}

#[test]
fn event_id_has_stable_prefix() {
    let id = EventId::new();
    assert!(id.as_str().starts_with("evt-"));
}

#[test]
fn ids_are_unique() {
    let a = JobId::new();
    let b = JobId::new();
    assert_ne!(a, b);
}

#[test]
fn ids_hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    let id = JobId::from_string("job-123-abc");
    map.insert(id, 42);
    assert_eq!(map.get("job-123-abc"), Some(&42));
}

#[test]
fn suffix_strips_prefix() {
    let id = JobId::from_string("job-1700000000000-abcdef012345");
    assert_eq!(id.suffix(), "1700000000000-abcdef012345");
}

#[test]
fn round_trips_through_display_and_from_string() {
    let id = JobId::new();
    let round_tripped = JobId::from_string(id.to_string());
    assert_eq!(id, round_tripped);
}
