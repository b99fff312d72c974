// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation with listener callbacks.

use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Error returned by [`CancellationToken::throw_if_cancelled`].
#[derive(Debug, Clone, Error)]
#[error("cancelled{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
pub struct CancellationError {
    pub reason: Option<String>,
}

type Listener = Box<dyn FnMut() + Send>;

struct Inner {
    cancelled: AtomicBool,
    reason: Mutex<Option<String>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
}

/// Cooperative cancellation signal, shared between the caller that may cancel
/// a job and the executor engine driving it.
///
/// `cancel()` is idempotent and fires every registered listener exactly once.
/// The listener list is copied out before invocation so a listener that
/// registers or removes another listener cannot deadlock or skip callbacks
/// (see the teacher's reentrancy-avoidance convention for callback lists).
#[derive(Clone)]
pub struct CancellationToken(Arc<Inner>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            cancelled: AtomicBool::new(false),
            reason: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }))
    }

    /// Signal cancellation. Idempotent: a second call is a no-op and does
    /// not re-invoke listeners.
    pub fn cancel(&self, reason: Option<String>) {
        if self.0.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.0.reason.lock() = reason;

        // Copy listeners out before invoking, per the reentrancy-avoidance
        // convention: a listener may itself register or unregister others.
        let mut listeners: Vec<(u64, Listener)> = std::mem::take(&mut *self.0.listeners.lock());
        for (_, mut listener) in listeners.drain(..) {
            // A panicking listener must not block delivery to the rest, nor
            // propagate into the caller of `cancel()`.
            let _ = std::panic::catch_unwind(AssertUnwindSafe(|| listener()));
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<String> {
        self.0.reason.lock().clone()
    }

    /// Register a callback to run (at most once) when cancellation fires.
    /// Returns an unregister closure. If the token is already cancelled, the
    /// callback runs immediately and the returned closure is a no-op.
    pub fn on_cancel(&self, mut callback: impl FnMut() + Send + 'static) -> impl FnOnce() {
        if self.is_cancelled() {
            callback();
            return Self::noop_unregister();
        }
        let id = self.0.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.0.listeners.lock().push((id, Box::new(callback)));

        let inner = self.0.clone();
        move || {
            inner.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
        }
    }

    fn noop_unregister() -> impl FnOnce() {
        || {}
    }

    /// Returns `Err` if cancellation has fired.
    pub fn throw_if_cancelled(&self) -> Result<(), CancellationError> {
        if self.is_cancelled() {
            Err(CancellationError { reason: self.reason() })
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cancellation_tests.rs"]
mod tests;
