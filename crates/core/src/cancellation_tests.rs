// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn not_cancelled_by_default() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
    assert!(token.throw_if_cancelled().is_ok());
}

#[test]
fn cancel_sets_reason_and_flag() {
    let token = CancellationToken::new();
    token.cancel(Some("user aborted".to_string()));
    assert!(token.is_cancelled());
    assert_eq!(token.reason(), Some("user aborted".to_string()));
    assert!(token.throw_if_cancelled().is_err());
}

#[test]
fn cancel_is_idempotent_and_fires_listener_once() {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let _unregister = token.on_cancel(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });

    token.cancel(None);
    token.cancel(None);
    token.cancel(Some("ignored".to_string()));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // First cancel reason wins.
    assert_eq!(token.reason(), None);
}

#[test]
fn listener_registered_after_cancel_runs_immediately() {
    let token = CancellationToken::new();
    token.cancel(None);

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let _unregister = token.on_cancel(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unregister_prevents_future_invocation() {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let unregister = token.on_cancel(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });

    unregister();
    token.cancel(None);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn panicking_listener_does_not_block_others_or_propagate() {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let _unreg1 = token.on_cancel(|| panic!("boom"));
    let calls_clone = calls.clone();
    let _unreg2 = token.on_cancel(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });

    token.cancel(None);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn listener_can_register_another_listener_without_deadlock() {
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let token_clone = token.clone();
    let calls_for_inner = calls.clone();
    let _unreg = token.on_cancel(move || {
        let calls_inner = calls_for_inner.clone();
        let _ = token_clone.on_cancel(move || {
            calls_inner.fetch_add(1, Ordering::SeqCst);
        });
    });

    token.cancel(None);
    // The listener registered during cancellation fires immediately
    // (token is already cancelled by the time it registers).
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
