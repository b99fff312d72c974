// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::any::Any;

#[derive(Debug)]
struct ItemLoaded {
    count: usize,
}

impl DomainEvent for ItemLoaded {
    fn event_name(&self) -> &'static str {
        "item:loaded"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn framework_event_type_names_are_stable() {
    assert_eq!(FrameworkEvent::JobStarted.type_name(), "job:started");
    assert_eq!(FrameworkEvent::JobCacheHit.type_name(), "job:cache_hit");
    assert_eq!(
        FrameworkEvent::JobProgress { value: 0.5, message: None }.type_name(),
        "progress"
    );
}

#[test]
fn domain_event_round_trips_through_downcast() {
    let event = Event::domain(
        JobId::new(),
        0,
        Some("LoadItems"),
        Box::new(ItemLoaded { count: 3 }),
    );
    assert_eq!(event.type_name(), "item:loaded");
    let loaded = event.as_domain::<ItemLoaded>().expect("downcast should succeed");
    assert_eq!(loaded.count, 3);
    assert!(event.as_framework().is_none());
}

#[test]
fn framework_event_is_not_a_domain_event() {
    let event = Event::framework(JobId::new(), 0, None, FrameworkEvent::JobStarted);
    assert!(event.as_domain::<ItemLoaded>().is_none());
    assert!(matches!(event.as_framework(), Some(FrameworkEvent::JobStarted)));
}

#[test]
fn wrong_domain_type_fails_downcast() {
    #[derive(Debug)]
    struct Other;
    impl DomainEvent for Other {
        fn event_name(&self) -> &'static str {
            "other"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }
    let event = Event::domain(JobId::new(), 0, None, Box::new(Other));
    assert!(event.as_domain::<ItemLoaded>().is_none());
}

#[test]
fn event_carries_its_correlation_id() {
    let job_id = JobId::new();
    let event = Event::framework(job_id.clone(), 0, None, FrameworkEvent::JobStarted);
    assert_eq!(event.correlation_id, job_id);
}
