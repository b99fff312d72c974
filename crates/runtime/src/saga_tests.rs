use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn run_registers_a_compensation_only_on_success() {
    let saga = SagaFlow::new();
    let undone = Arc::new(AtomicUsize::new(0));

    let ok: Result<u32, &'static str> = saga
        .run(
            || async { Ok(1u32) },
            {
                let undone = undone.clone();
                move |_value| async move {
                    undone.fetch_add(1, Ordering::SeqCst);
                }
            },
        )
        .await;
    assert!(ok.is_ok());
    assert_eq!(saga.pending_compensations(), 1);

    let err: Result<u32, &'static str> = saga.run(|| async { Err("boom") }, |_: u32| async {}).await;
    assert!(err.is_err());
    assert_eq!(saga.pending_compensations(), 1);
}

#[tokio::test]
async fn rollback_runs_compensations_lifo() {
    let saga = SagaFlow::new();
    let order = Arc::new(Mutex::new(Vec::<u32>::new()));

    for step in [1u32, 2, 3] {
        let order = order.clone();
        let _: Result<u32, ()> = saga
            .run(move || async move { Ok(step) }, move |value| async move { order.lock().push(value) })
            .await;
    }

    saga.rollback().await;
    assert_eq!(*order.lock(), vec![3, 2, 1]);
    assert_eq!(saga.pending_compensations(), 0);
}

#[tokio::test]
async fn commit_clears_compensations_without_running_them() {
    let saga = SagaFlow::new();
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_for_compensation = ran.clone();
    let _: Result<u32, ()> = saga
        .run(|| async { Ok(1u32) }, move |_| {
            let ran = ran_for_compensation.clone();
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

    saga.commit();
    assert_eq!(saga.pending_compensations(), 0);
    saga.rollback().await;
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_panicking_compensation_does_not_stop_the_remaining_rollback() {
    let saga = SagaFlow::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let _: Result<u32, ()> = saga.run(|| async { Ok(1u32) }, |_| async { panic!("boom") }).await;
    let ran_for_second = ran.clone();
    let _: Result<u32, ()> = saga
        .run(|| async { Ok(2u32) }, move |_| {
            let ran = ran_for_second.clone();
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

    saga.rollback().await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
