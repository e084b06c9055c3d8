// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::new_without_default)]
#![allow(clippy::useless_vec)]

pub mod analyzer;
pub mod burst;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod latch;
pub mod matcher;
pub mod orchestrator;
pub mod outcome;
pub mod probe;
pub mod report;
pub mod request;
pub mod state;
pub mod transport;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_imports() {
        let _ = config::RunConfig::new();
        let _ = state::RunState::new();
        let _ = latch::Latch::new(1);
        let _ = matcher::OccurrenceCounter::new("");
        let _ = report::CollectingReporter::new();
        let _ = request::TargetRequest::new("GET", "/");
        let _ = outcome::BurstOutcome::new(200, Vec::new(), "HTTP/1.1");
        let analysis = analyzer::DifferentialAnalyzer::analyze(&[], None, None);
        assert_eq!(analysis.verdict, analyzer::Verdict::FailedNoResponses);
    }
}
