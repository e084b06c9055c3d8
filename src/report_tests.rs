// File: report_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use super::*;
use crate::analyzer::DifferentialAnalyzer;
use crate::test_support::{outcome, target};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn create_temp_file(name: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join(name).to_string_lossy().to_string();
    (temp_dir, file_path)
}

fn sample_report() -> RunReport {
    let outcomes = vec![outcome(200, "created"), outcome(200, "created"), outcome(409, "dupe")];
    let pre = ProbeResult::new("order", 1, false);
    let post = ProbeResult::new("order", 3, false);
    let analysis = DifferentialAnalyzer::analyze(&outcomes, Some(&pre), Some(&post));
    RunReport::new(&target(), "Standard", &analysis, Some(&pre), Some(&post))
}

#[test]
fn test_run_report_fields() {
    let report = sample_report();
    assert_eq!(report.target, "POST https://shop.test/api/redeem");
    assert_eq!(report.verdict, "CRITICAL (Duplication)");
    assert_eq!(report.severity, Severity::Critical);
    assert_eq!(report.analysis.rows.len(), 3);
}

#[test]
fn test_write_json_report() {
    let (_temp_dir, file_path) = create_temp_file("report.json");
    sample_report().write_json(&file_path).unwrap();

    let content = fs::read_to_string(&file_path).unwrap();
    let json: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["verdict"], "CRITICAL (Duplication)");
    assert_eq!(json["analysis"]["total_baseline_successes"], 2);
    assert_eq!(json["analysis"]["probe_diff"], 2);
    assert_eq!(json["analysis"]["rows"][2]["note"]["Code"], 409);
    assert_eq!(json["analysis"]["rows"][0]["http_version"], "HTTP/1.1");
    assert_eq!(json["pre_probe"]["count"], 1);
    assert_eq!(json["post_probe"]["value"], "order");
}

#[test]
fn test_write_text_report() {
    let (_temp_dir, file_path) = create_temp_file("report.txt");
    sample_report().write_text(&file_path).unwrap();

    let content = fs::read_to_string(&file_path).unwrap();
    assert!(content.contains("Verdict: CRITICAL (Duplication)"));
    assert!(content.contains("Probe: order (Count: 1) -> order (Count: 3)"));
    assert!(content.contains("3 409 4"));
    assert!(content.contains("Code 409 [HTTP/1.1]"));
}

#[test]
fn test_write_report_to_missing_directory_fails() {
    let report = sample_report();
    assert!(report.write_json("/nonexistent/dir/report.json").is_err());
}

#[test]
fn test_collecting_reporter() {
    let reporter = CollectingReporter::new();
    let report = sample_report();
    for row in &report.analysis.rows {
        reporter.present_result(row, false);
    }
    reporter.report_verdict(&report.analysis.verdict, &report.analysis.message);

    assert_eq!(reporter.rows().len(), 3);
    assert_eq!(reporter.rows()[0].note, RowNote::ExactMatch);
    let verdicts = reporter.verdicts();
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].0, Verdict::CriticalDuplication);
}
