// File: latch.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Count-down latch: waiters are released together, with a single broadcast,
/// once the count reaches zero. A latch of one is a single-release gate.
#[derive(Debug)]
pub struct Latch {
    remaining: AtomicUsize,
    opened: Notify,
}

impl Latch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            opened: Notify::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.count() == 0
    }

    pub fn count_down(&self) {
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.opened.notify_waiters();
        }
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.opened.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent release cannot be missed.
            notified.as_mut().enable();
            if self.is_open() {
                return;
            }
            notified.await;
        }
    }

    /// Returns `false` if the deadline passed before the latch opened.
    pub async fn wait_timeout(&self, deadline: Duration) -> bool {
        tokio::time::timeout(deadline, self.wait()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_latch_opens_at_zero() {
        let latch = Latch::new(2);
        assert!(!latch.is_open());
        latch.count_down();
        assert_eq!(latch.count(), 1);
        latch.count_down();
        assert!(latch.is_open());
        latch.wait().await;
    }

    #[tokio::test]
    async fn test_count_down_saturates() {
        let latch = Latch::new(1);
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.count(), 0);
    }

    #[tokio::test]
    async fn test_zero_latch_is_open() {
        let latch = Latch::new(0);
        assert!(latch.wait_timeout(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_wait_timeout_expires() {
        let latch = Latch::new(1);
        assert!(!latch.wait_timeout(Duration::from_millis(20)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_gate_releases_all_waiters() {
        let gate = Arc::new(Latch::new(1));
        let released = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            let released = Arc::clone(&released);
            handles.push(tokio::spawn(async move {
                gate.wait().await;
                released.fetch_add(1, Ordering::SeqCst);
            }));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(released.load(Ordering::SeqCst), 0);

        gate.count_down();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(released.load(Ordering::SeqCst), 8);
    }
}
