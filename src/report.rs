// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::analyzer::{Analysis, ResultRow, RowNote, Severity, Verdict};
use crate::probe::ProbeResult;
use crate::request::TargetRequest;
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;
use std::fs::File;
use std::io::{Result, Write};
use std::sync::Mutex;

/// Presentation layer the auditor pushes rows and the verdict to.
pub trait Reporter: Send + Sync {
    fn present_result(&self, row: &ResultRow, is_error_baseline: bool);
    fn report_verdict(&self, verdict: &Verdict, message: &str);
}

pub struct ConsoleReporter {
    header_printed: Mutex<bool>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            header_printed: Mutex::new(false),
        }
    }

    fn print_header_once(&self) {
        let mut printed = match self.header_printed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !*printed {
            println!(
                "{}",
                format!(
                    "{:>4}  {:>6}  {:>8}  {:<12} {}",
                    "#", "Status", "Length", "Hash", "Note"
                )
                .bold()
            );
            *printed = true;
        }
    }
}

impl Reporter for ConsoleReporter {
    fn present_result(&self, row: &ResultRow, is_error_baseline: bool) {
        self.print_header_once();
        let line = format!(
            "{:>4}  {:>6}  {:>8}  {:<12} {}",
            row.index, row.status, row.body_length, row.short_hash, row.note
        );
        let line = match row.note {
            RowNote::ExactMatch if is_error_baseline => line.dimmed(),
            RowNote::ExactMatch => line.green(),
            _ => line.red().bold(),
        };
        println!("{}", line);
    }

    fn report_verdict(&self, verdict: &Verdict, message: &str) {
        let banner = format!(" VERDICT: {} ", verdict);
        let banner = match verdict.severity() {
            Severity::Critical => banner.on_red().white().bold(),
            Severity::High => banner.on_yellow().black().bold(),
            Severity::Medium => banner.on_bright_yellow().black().bold(),
            Severity::Safe => banner.on_green().white().bold(),
            Severity::Failed => banner.on_bright_black().white().bold(),
            Severity::Neutral => banner.on_white().black().bold(),
        };
        println!();
        println!("{}", banner);
        println!("{}", message);
    }
}

/// Keeps everything it is given, for JSON output and tests.
#[derive(Default)]
pub struct CollectingReporter {
    rows: Mutex<Vec<ResultRow>>,
    verdicts: Mutex<Vec<(Verdict, String)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<ResultRow> {
        match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn verdicts(&self) -> Vec<(Verdict, String)> {
        match self.verdicts.lock() {
            Ok(verdicts) => verdicts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Reporter for CollectingReporter {
    fn present_result(&self, row: &ResultRow, _is_error_baseline: bool) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(row.clone());
        }
    }

    fn report_verdict(&self, verdict: &Verdict, message: &str) {
        if let Ok(mut verdicts) = self.verdicts.lock() {
            verdicts.push((*verdict, message.to_string()));
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub target: String,
    pub strategy: String,
    pub verdict: String,
    pub severity: Severity,
    pub pre_probe: Option<ProbeResult>,
    pub post_probe: Option<ProbeResult>,
    pub analysis: Analysis,
}

impl RunReport {
    pub fn new(
        target: &TargetRequest,
        strategy: &str,
        analysis: &Analysis,
        pre_probe: Option<&ProbeResult>,
        post_probe: Option<&ProbeResult>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            target: target.to_string(),
            strategy: strategy.to_string(),
            verdict: analysis.verdict.to_string(),
            severity: analysis.verdict.severity(),
            pre_probe: pre_probe.cloned(),
            post_probe: post_probe.cloned(),
            analysis: analysis.clone(),
        }
    }

    pub fn write_json(&self, output_path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(output_path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    pub fn write_text(&self, output_path: &str) -> Result<()> {
        let mut file = File::create(output_path)?;
        writeln!(file, "{} {} [{}]", self.timestamp.to_rfc3339(), self.target, self.strategy)?;
        writeln!(file, "Verdict: {}", self.verdict)?;
        if let (Some(pre), Some(post)) = (&self.pre_probe, &self.post_probe) {
            writeln!(file, "Probe: {} -> {}", pre, post)?;
        }
        for row in &self.analysis.rows {
            writeln!(
                file,
                "{} {} {} {} {} [{}]",
                row.index,
                row.status,
                row.body_length,
                row.short_hash,
                row.note,
                row.http_version
            )?;
        }
        writeln!(file)?;
        writeln!(file, "{}", self.analysis.message)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
