// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boolean online/offline signal with a change stream (spec §6).

use tokio::sync::watch;

/// The core treats an unknown connectivity state as online; implementations
/// should default their initial value to `true` unless they can prove
/// otherwise at construction time.
pub trait ConnectivityProvider: Send + Sync {
    fn is_connected(&self) -> bool;

    /// A receiver that yields the latest connectivity value, once per
    /// transition. Subscribers that only care about edges should compare
    /// against the previously observed value themselves.
    fn on_change(&self) -> watch::Receiver<bool>;
}

pub struct InMemoryConnectivityProvider {
    tx: watch::Sender<bool>,
}

impl InMemoryConnectivityProvider {
    pub fn new(connected: bool) -> Self {
        let (tx, _rx) = watch::channel(connected);
        Self { tx }
    }

    /// Flip connectivity. A no-op if the value doesn't change, so
    /// subscribers relying on `changed()` don't see spurious wakeups.
    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != connected;
            *current = connected;
            changed
        });
    }
}

impl Default for InMemoryConnectivityProvider {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProvider for InMemoryConnectivityProvider {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn on_change(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
