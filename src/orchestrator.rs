// File: orchestrator.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::analyzer::{Analysis, DifferentialAnalyzer};
use crate::burst::{BurstEngine, BurstStrategy};
use crate::config::RunConfig;
use crate::errors::{RaceError, RaceResult};
use crate::probe::{truncate, ProbeExecutor, ProbeResult};
use crate::report::Reporter;
use crate::request::TargetRequest;
use crate::state::RunState;
use crate::transport::Transport;
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AuditRun {
    pub target: Arc<TargetRequest>,
    pub strategy: BurstStrategy,
    pub pre_probe: Option<ProbeResult>,
    pub post_probe: Option<ProbeResult>,
    pub analysis: Analysis,
}

// Clears the running flag however the run ends.
struct RunGuard<'a>(&'a RunState);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Sequences one audit: pre-probe, burst, settle, post-probe, analysis.
///
/// Only one run may be active per auditor; a second `run` while one is in
/// flight is rejected with [`RaceError::RunInProgress`]. `stop` can be called
/// from any task and cancels the active run cooperatively.
pub struct RaceAuditor {
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn Reporter>,
    state: Arc<RunState>,
    config: RunConfig,
    show_progress: bool,
}

impl RaceAuditor {
    pub fn new(
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn Reporter>,
        config: RunConfig,
    ) -> Self {
        Self {
            transport,
            reporter,
            state: Arc::new(RunState::new()),
            config,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn stop(&self) {
        if self.state.is_running() {
            self.state.stop();
            warn!("!!! ANALYSIS STOPPED !!!");
        }
    }

    pub fn shutdown(&self) {
        self.stop();
        info!("Auditor shutting down. Resources cleaned.");
    }

    /// Freezes the target (destination recovered, `Content-Length` fixed).
    /// A target without a destination is a configuration error.
    pub fn prepare_target(target: TargetRequest) -> RaceResult<TargetRequest> {
        let target = target.with_recovered_service(None).with_fixed_content_length();
        if !target.has_destination() {
            return Err(RaceError::Configuration(
                "Target Request invalid or missing HTTP Service (Host/Port)".to_string(),
            ));
        }
        Ok(target)
    }

    /// A probe without a usable destination is dropped, not fatal.
    pub fn prepare_probe(probe: Option<TargetRequest>) -> Option<TargetRequest> {
        let probe = probe?.with_recovered_service(None).with_fixed_content_length();
        if probe.has_destination() {
            Some(probe)
        } else {
            warn!("Probe request has no HTTP service, running without probe");
            None
        }
    }

    pub async fn run(
        &self,
        target: TargetRequest,
        probe: Option<TargetRequest>,
    ) -> RaceResult<AuditRun> {
        let target = Arc::new(Self::prepare_target(target)?);
        let probe = Self::prepare_probe(probe);

        if !self.state.try_start() {
            return Err(RaceError::RunInProgress);
        }
        let _guard = RunGuard(&self.state);

        info!("--- STARTING ANALYSIS ---");
        let strategy = BurstStrategy::from_pooled(self.config.use_pooled_strategy());
        let prober = ProbeExecutor::new(Arc::clone(&self.transport), self.config.match_input());
        if probe.is_some() {
            info!(
                "Probe Status: ACTIVE (Counting occurrences of: '{}')",
                prober.counting()
            );
        } else {
            info!("Probe Status: INACTIVE (Standard Attack Only)");
        }

        self.ensure_running()?;
        let pre_probe = match &probe {
            Some(request) => {
                info!("[1] Executing Initial State Probe...");
                let result = prober.execute(Some(request)).await;
                info!("    > Initial: {}", describe(&result));
                Some(result)
            }
            None => None,
        };

        self.ensure_running()?;
        info!(
            "[2] Preparing concurrent workers ({}, {} workers)...",
            strategy,
            self.config.worker_count()
        );
        let engine = BurstEngine::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.state),
            self.config.stabilization_delay(),
        )
        .with_progress(self.show_progress);
        let outcomes = engine
            .fire(
                Arc::clone(&target),
                self.config.worker_count(),
                strategy,
                self.config.finish_timeout(),
            )
            .await;

        self.ensure_running()?;
        let post_probe = match &probe {
            Some(request) => {
                self.settle().await?;
                info!("[3] Executing Final State Probe...");
                let result = prober.execute(Some(request)).await;
                info!("    > Final: {}", describe(&result));
                Some(result)
            }
            None => None,
        };

        self.ensure_running()?;
        let analysis =
            DifferentialAnalyzer::analyze(&outcomes, pre_probe.as_ref(), post_probe.as_ref());
        if let Some(baseline) = &analysis.baseline {
            self.state.set_baseline(baseline.clone());
        }

        let is_error_baseline = analysis.baseline.as_ref().map_or(false, |b| b.is_error);
        for row in &analysis.rows {
            self.reporter.present_result(row, is_error_baseline);
        }
        self.reporter.report_verdict(&analysis.verdict, &analysis.message);
        info!("Verdict: {}", analysis.verdict);

        Ok(AuditRun {
            target,
            strategy,
            pre_probe,
            post_probe,
            analysis,
        })
    }

    fn ensure_running(&self) -> RaceResult<()> {
        if self.state.is_running() {
            Ok(())
        } else {
            info!("Process Interrupted.");
            Err(RaceError::Cancelled)
        }
    }

    // Gives the backend time to commit before the final probe.
    async fn settle(&self) -> RaceResult<()> {
        tokio::select! {
            _ = tokio::time::sleep(self.config.post_burst_settle()) => Ok(()),
            _ = self.state.stopped() => {
                info!("Process Interrupted.");
                Err(RaceError::Cancelled)
            }
        }
    }
}

fn describe(result: &ProbeResult) -> String {
    format!("{} (Count: {})", truncate(&result.value), result.count)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
