// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast primitive for "a job just finished".
//!
//! Waiters re-test an arbitrary condition on every broadcast; the condition
//! itself lives with the caller (in-flight set emptiness, job doneness).

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Condition-style broadcast over [`Notify`].
#[derive(Debug, Default)]
pub struct JobDoneNotifier {
    notify: Notify,
    closed: AtomicBool,
}

impl JobDoneNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake every current waiter so it can re-test its condition.
    pub fn notify(&self) {
        self.notify.notify_waiters();
    }

    /// A future resolving on the next [`notify`](Self::notify) call.
    ///
    /// Callers that test asynchronous conditions pin this, `enable()` it
    /// before testing and await it after, so no broadcast is lost between
    /// test and sleep.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until `test` returns true.
    ///
    /// Returns `true` when the condition was met, `false` when the notifier
    /// was closed while waiting.
    pub async fn wait_for(&self, mut test: impl FnMut() -> bool) -> bool {
        loop {
            let notified = self.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if test() {
                return true;
            }
            if self.is_closed() {
                return false;
            }
            notified.await;
        }
    }

    /// Release every waiter; subsequent waits fail fast.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
