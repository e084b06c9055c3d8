// File: burst.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::latch::Latch;
use crate::outcome::BurstOutcome;
use crate::request::TargetRequest;
use crate::state::RunState;
use crate::transport::Transport;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstStrategy {
    /// Fixed pool: one dedicated runtime thread per worker.
    Standard,
    /// Elastic pool on the caller's runtime, used as an HTTP/2 approximation.
    Pooled,
}

impl BurstStrategy {
    pub fn from_pooled(pooled: bool) -> Self {
        if pooled {
            BurstStrategy::Pooled
        } else {
            BurstStrategy::Standard
        }
    }
}

impl fmt::Display for BurstStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstStrategy::Standard => write!(f, "Standard"),
            BurstStrategy::Pooled => write!(f, "HTTP/2 Mux"),
        }
    }
}

// Dropping a `Runtime` inside async context panics, so the pool always tears
// down through `shutdown_background`, also when `fire` itself is dropped.
struct WorkerPool {
    runtime: Option<Runtime>,
    handle: Handle,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn new(strategy: BurstStrategy, worker_count: usize) -> Self {
        let runtime = match strategy {
            BurstStrategy::Pooled => None,
            BurstStrategy::Standard => match Builder::new_multi_thread()
                .worker_threads(worker_count)
                .thread_name("race-worker")
                .enable_all()
                .build()
            {
                Ok(runtime) => Some(runtime),
                Err(e) => {
                    warn!("Could not build a fixed worker pool, using shared runtime: {}", e);
                    None
                }
            },
        };
        let handle = match &runtime {
            Some(runtime) => runtime.handle().clone(),
            None => Handle::current(),
        };
        Self {
            runtime,
            handle,
            tasks: Vec::with_capacity(worker_count),
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(self.handle.spawn(task));
    }

    /// Tears the pool down without waiting for stragglers.
    fn shutdown(self) {
        drop(self);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

// Counts the worker as finished however its task ends, abort included.
struct FinishGuard(Arc<Latch>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.count_down();
    }
}

type SharedOutcomes = Arc<Mutex<Vec<BurstOutcome>>>;

fn push_outcome(outcomes: &SharedOutcomes, outcome: BurstOutcome) {
    match outcomes.lock() {
        Ok(mut guard) => guard.push(outcome),
        Err(poisoned) => poisoned.into_inner().push(outcome),
    }
}

fn take_outcomes(outcomes: &SharedOutcomes) -> Vec<BurstOutcome> {
    match outcomes.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    }
}

/// Fires one request from many workers at (nearly) the same instant.
///
/// Workers are spawned and parked behind a ready latch and a single-release
/// fire gate. Once every worker has checked in, the engine waits for the
/// stabilization delay, opens the gate once and collects whatever responses
/// arrive before the finish deadline. Workers still in flight at the deadline
/// are abandoned.
pub struct BurstEngine {
    transport: Arc<dyn Transport>,
    state: Arc<RunState>,
    stabilization_delay: Duration,
    show_progress: bool,
}

impl BurstEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        state: Arc<RunState>,
        stabilization_delay: Duration,
    ) -> Self {
        Self {
            transport,
            state,
            stabilization_delay,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn fire(
        &self,
        request: Arc<TargetRequest>,
        worker_count: usize,
        strategy: BurstStrategy,
        deadline: Duration,
    ) -> Vec<BurstOutcome> {
        let outcomes: SharedOutcomes = Arc::new(Mutex::new(Vec::with_capacity(worker_count)));
        if worker_count == 0 || !self.state.is_running() {
            return Vec::new();
        }

        let ready = Arc::new(Latch::new(worker_count));
        let gate = Arc::new(Latch::new(1));
        let finish = Arc::new(Latch::new(worker_count));
        let mut pool = WorkerPool::new(strategy, worker_count);

        for id in 0..worker_count {
            let request = Arc::clone(&request);
            let transport = Arc::clone(&self.transport);
            let state = Arc::clone(&self.state);
            let outcomes = Arc::clone(&outcomes);
            let ready = Arc::clone(&ready);
            let gate = Arc::clone(&gate);
            let finished = FinishGuard(Arc::clone(&finish));

            pool.spawn(async move {
                let _finished = finished;
                ready.count_down();
                gate.wait().await;
                if !state.is_running() {
                    return;
                }
                match transport.send(&request).await {
                    Ok(outcome) => push_outcome(&outcomes, outcome),
                    Err(e) => warn!("Worker {} failed: {}", id, e),
                }
            });
        }

        let aligned = tokio::select! {
            _ = ready.wait() => self.state.is_running(),
            _ = self.state.stopped() => false,
        };
        if !aligned {
            info!("Burst cancelled before release, tearing down workers");
            pool.shutdown();
            return take_outcomes(&outcomes);
        }

        info!("    > Gates aligned. Syncing...");
        tokio::time::sleep(self.stabilization_delay).await;
        if !self.state.is_running() {
            info!("Burst cancelled during stabilization, tearing down workers");
            pool.shutdown();
            return take_outcomes(&outcomes);
        }

        gate.count_down();
        debug!("Fire gate released for {} workers", worker_count);

        let progress = self.progress_bar(worker_count);
        let completed = tokio::time::timeout(deadline, async {
            let mut tick = tokio::time::interval(Duration::from_millis(50));
            loop {
                tokio::select! {
                    _ = finish.wait() => break,
                    _ = tick.tick() => {
                        progress.set_position((worker_count - finish.count()) as u64)
                    }
                }
            }
        })
        .await
        .is_ok();
        progress.finish_and_clear();

        if !completed {
            warn!(
                "{} of {} workers still pending after {:?}, abandoning them",
                finish.count(),
                worker_count,
                deadline
            );
        }

        pool.shutdown();
        let collected = take_outcomes(&outcomes);
        info!("    > Burst complete: {}/{} responses", collected.len(), worker_count);
        collected
    }

    fn progress_bar(&self, worker_count: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(worker_count as u64);
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        pb
    }
}

#[cfg(test)]
#[path = "burst_tests.rs"]
mod tests;
