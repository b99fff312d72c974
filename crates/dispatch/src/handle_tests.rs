// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobkit_core::source::DataSource;

#[tokio::test]
async fn completes_with_fresh_result() {
    let (handle, controller) = JobHandle::<u32>::pair(JobId::new());
    controller.complete(7, DataSource::Fresh);
    let result = handle.result().await.unwrap();
    assert_eq!(result.data, 7);
    assert!(matches!(result.source, DataSource::Fresh));
}

#[tokio::test]
async fn second_completion_is_silently_ignored() {
    let (handle, controller) = JobHandle::<u32>::pair(JobId::new());
    controller.complete(1, DataSource::Fresh);
    controller.complete(2, DataSource::Fresh);
    let result = handle.result().await.unwrap();
    assert_eq!(result.data, 1);
}

#[tokio::test]
async fn complete_error_surfaces_through_result() {
    let (handle, controller) = JobHandle::<u32>::pair(JobId::new());
    controller.complete_error(EngineError::TimedOut { duration_ms: 10 });
    let result = handle.result().await;
    assert!(matches!(result, Err(EngineError::TimedOut { duration_ms: 10 })));
}

#[tokio::test]
async fn progress_has_multiple_listeners() {
    let (handle, controller) = JobHandle::<u32>::pair(JobId::new());
    let mut sub1 = handle.progress();
    let mut sub2 = handle.progress();
    controller.report_progress(0.5, Some("halfway".to_string()));
    assert_eq!(sub1.recv().await.unwrap(), (0.5, Some("halfway".to_string())));
    assert_eq!(sub2.recv().await.unwrap(), (0.5, Some("halfway".to_string())));
}

#[tokio::test]
async fn progress_value_is_clamped_to_unit_interval() {
    let (handle, controller) = JobHandle::<u32>::pair(JobId::new());
    let mut sub = handle.progress();
    controller.report_progress(1.5, None);
    assert_eq!(sub.recv().await.unwrap().0, 1.0);
}

#[test]
fn is_completed_reflects_terminal_state_on_both_halves() {
    let (handle, controller) = JobHandle::<u32>::pair(JobId::new());
    assert!(!handle.is_completed());
    controller.complete(1, DataSource::Fresh);
    assert!(handle.is_completed());
    assert!(controller.is_completed());
}
