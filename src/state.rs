// File: state.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Baseline {
    pub status: u16,
    pub hash: String,
    pub is_error: bool,
}

/// Shared state of the current run. `is_running` is the one flag burst
/// workers and probes consult before doing anything.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    stopped: Notify,
    baseline: Mutex<Option<Baseline>>,
}

impl RunState {
    pub fn new() -> RunState {
        RunState::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Marks the run active and clears the previous baseline. Returns `false`
    /// if a run was already active.
    pub fn try_start(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.clear_baseline();
        true
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stopped.notify_waiters();
    }

    /// Resolves once the run is no longer marked running.
    pub async fn stopped(&self) {
        loop {
            let notified = self.stopped.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn set_baseline(&self, baseline: Baseline) {
        match self.baseline.lock() {
            Ok(mut guard) => *guard = Some(baseline),
            Err(poisoned) => *poisoned.into_inner() = Some(baseline),
        }
    }

    fn clear_baseline(&self) {
        match self.baseline.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_new_state_is_idle() {
        let state = RunState::new();
        assert!(!state.is_running());
        assert_eq!(state.baseline(), None);
    }

    #[test]
    fn test_try_start_rejects_second_run() {
        let state = RunState::new();
        assert!(state.try_start());
        assert!(!state.try_start());
        state.stop();
        assert!(state.try_start());
    }

    #[test]
    fn test_start_clears_baseline() {
        let state = RunState::new();
        state.set_baseline(Baseline {
            status: 200,
            hash: "abc".to_string(),
            is_error: false,
        });
        assert!(state.baseline().is_some());
        assert!(state.try_start());
        assert_eq!(state.baseline(), None);
    }

    #[tokio::test]
    async fn test_stopped_resolves_on_stop() {
        let state = Arc::new(RunState::new());
        state.try_start();
        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.stopped().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        state.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
