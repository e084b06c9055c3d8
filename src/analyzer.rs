// File: analyzer.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::fingerprint::short_fingerprint;
use crate::outcome::BurstOutcome;
use crate::probe::ProbeResult;
use crate::state::Baseline;
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Safe,
    Failed,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    FailedNoResponses,
    CriticalDuplication,
    HighSilentDuplication,
    MediumPossibleIdempotent,
    MediumStateChange,
    SafeNormal,
    SafeNoChange,
    FailedAllError(u16),
    Unstable,
    SafeSingleSuccess,
    HighVariation,
    MediumIdempotentSuspected,
}

impl Verdict {
    pub fn severity(&self) -> Severity {
        match self {
            Verdict::CriticalDuplication => Severity::Critical,
            Verdict::HighSilentDuplication | Verdict::HighVariation => Severity::High,
            Verdict::MediumPossibleIdempotent
            | Verdict::MediumStateChange
            | Verdict::MediumIdempotentSuspected => Severity::Medium,
            Verdict::SafeNormal | Verdict::SafeNoChange | Verdict::SafeSingleSuccess => {
                Severity::Safe
            }
            Verdict::FailedAllError(_) => Severity::Failed,
            Verdict::FailedNoResponses | Verdict::Unstable => Severity::Neutral,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::FailedNoResponses => write!(f, "FAILED"),
            Verdict::CriticalDuplication => write!(f, "CRITICAL (Duplication)"),
            Verdict::HighSilentDuplication => write!(f, "HIGH (Silent Dupes)"),
            Verdict::MediumPossibleIdempotent => write!(f, "MEDIUM (Idempotent?)"),
            Verdict::MediumStateChange => write!(f, "MEDIUM (State Change)"),
            Verdict::SafeNormal => write!(f, "SAFE"),
            Verdict::SafeNoChange => write!(f, "SAFE (NO CHANGE)"),
            Verdict::FailedAllError(status) => write!(f, "FAILED (ALL {})", status),
            Verdict::Unstable => write!(f, "UNSTABLE"),
            Verdict::SafeSingleSuccess => write!(f, "SAFE"),
            Verdict::HighVariation => write!(f, "HIGH (Variation)"),
            Verdict::MediumIdempotentSuspected => write!(f, "MEDIUM (Idempotent?)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowNote {
    ExactMatch,
    DifferentBody,
    Code(u16),
}

impl fmt::Display for RowNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowNote::ExactMatch => write!(f, "Ref Match"),
            RowNote::DifferentBody => write!(f, "Diff Body"),
            RowNote::Code(status) => write!(f, "Code {}", status),
        }
    }
}

/// One annotated burst response, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub index: usize,
    pub status: u16,
    pub body_length: usize,
    pub short_hash: String,
    pub note: RowNote,
    pub http_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub verdict: Verdict,
    pub message: String,
    pub baseline: Option<Baseline>,
    pub total_responses: usize,
    pub total_baseline_successes: usize,
    pub unique_hashes_among_baseline: usize,
    pub probe_diff: Option<i64>,
    pub rows: Vec<ResultRow>,
}

/// Facts the verdict rules are evaluated against.
#[derive(Debug)]
pub struct Evidence<'a> {
    pub total: usize,
    pub successes: usize,
    pub unique_hashes: usize,
    pub baseline_status: u16,
    pub is_error_baseline: bool,
    pub probes: Option<(&'a ProbeResult, &'a ProbeResult)>,
}

impl Evidence<'_> {
    /// Both probes ran and neither reported an error.
    pub fn probe_ok(&self) -> bool {
        matches!(self.probes, Some((pre, post)) if !pre.is_error && !post.is_error)
    }

    pub fn diff(&self) -> i64 {
        self.probes.map_or(0, |(pre, post)| post.count - pre.count)
    }

    fn probe_value_changed(&self) -> bool {
        self.probes.map_or(false, |(pre, post)| pre.value != post.value)
    }
}

pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&Evidence) -> bool,
    pub verdict: fn(&Evidence) -> Verdict,
}

/// Evaluated top to bottom; the first rule that applies decides. Probe rules
/// that do not fire fall through to the HTTP-only rules.
pub static RULES: &[Rule] = &[
    Rule {
        name: "no-responses",
        applies: |e| e.total == 0,
        verdict: |_| Verdict::FailedNoResponses,
    },
    Rule {
        name: "critical-duplication",
        applies: |e| e.probe_ok() && e.successes > 1 && e.diff() > 1,
        verdict: |_| Verdict::CriticalDuplication,
    },
    Rule {
        name: "silent-duplication",
        applies: |e| e.probe_ok() && e.successes <= 1 && e.diff() > 1,
        verdict: |_| Verdict::HighSilentDuplication,
    },
    Rule {
        name: "possible-idempotent",
        applies: |e| e.probe_ok() && e.successes > 1 && e.diff() <= 1,
        verdict: |_| Verdict::MediumPossibleIdempotent,
    },
    Rule {
        name: "state-change",
        applies: |e| e.probe_ok() && e.diff() == 0 && e.probe_value_changed(),
        verdict: |_| Verdict::MediumStateChange,
    },
    Rule {
        name: "normal",
        applies: |e| e.probe_ok() && e.successes == 1 && e.diff() == 1,
        verdict: |_| Verdict::SafeNormal,
    },
    Rule {
        name: "no-change",
        applies: |e| e.probe_ok() && e.diff() == 0,
        verdict: |_| Verdict::SafeNoChange,
    },
    Rule {
        name: "all-error",
        applies: |e| e.is_error_baseline && e.successes == e.total,
        verdict: |e| Verdict::FailedAllError(e.baseline_status),
    },
    Rule {
        name: "unstable",
        applies: |e| e.is_error_baseline,
        verdict: |_| Verdict::Unstable,
    },
    Rule {
        name: "single-success",
        applies: |e| e.successes <= 1,
        verdict: |_| Verdict::SafeSingleSuccess,
    },
    Rule {
        name: "variation",
        applies: |e| e.unique_hashes > 1,
        verdict: |_| Verdict::HighVariation,
    },
    Rule {
        name: "idempotent-suspected",
        applies: |_| true,
        verdict: |_| Verdict::MediumIdempotentSuspected,
    },
];

pub fn evaluate(evidence: &Evidence) -> Verdict {
    for rule in RULES {
        if (rule.applies)(evidence) {
            log::debug!("Verdict rule '{}' matched", rule.name);
            return (rule.verdict)(evidence);
        }
    }
    Verdict::MediumIdempotentSuspected
}

/// Prefers the lowest 2xx/3xx status; otherwise the most frequent status,
/// lowest code on ties.
pub fn select_baseline_status(outcomes: &[BurstOutcome]) -> Option<u16> {
    let mut counts: BTreeMap<u16, usize> = BTreeMap::new();
    for outcome in outcomes {
        *counts.entry(outcome.status()).or_insert(0) += 1;
    }

    if let Some(status) = counts.keys().find(|s| (200..400).contains(*s)) {
        return Some(*status);
    }
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(status, _)| *status)
}

pub fn explain(verdict: &Verdict, evidence: &Evidence) -> String {
    match verdict {
        Verdict::FailedNoResponses => "No responses received.".to_string(),
        Verdict::CriticalDuplication => format!(
            "CRITICAL VULNERABILITY DETECTED!\n\n\
             1. HTTP Layer: {} successful responses.\n\
             2. Application State: {} new resources created.\n\n\
             This confirms a Race Condition with duplication.",
            evidence.successes,
            evidence.diff()
        ),
        Verdict::HighSilentDuplication => format!(
            "HIGH RISK ANOMALY DETECTED!\n\n\
             1. HTTP Layer: Few or no successful responses.\n\
             2. Application State: {} new resources created (Duplication!).\n\n\
             The server tried to block requests, but the backend processed them anyway.",
            evidence.diff()
        ),
        Verdict::MediumPossibleIdempotent => format!(
            "POTENTIAL IDEMPOTENCY DETECTED\n\n\
             1. HTTP Layer: {} successful responses.\n\
             2. Application State: {} changes/creations.\n\n\
             The server accepts multiple requests in parallel. \
             No duplicates were found, so this is likely an idempotent action, \
             but verify whether overwriting data is a risk.",
            evidence.successes,
            evidence.diff()
        ),
        Verdict::MediumStateChange => {
            "STATE CHANGE DETECTED (No Duplication).\nThe value changed, but count remained same."
                .to_string()
        }
        Verdict::SafeNormal => "SAFE: Normal behavior (1 Request = 1 Creation).".to_string(),
        Verdict::SafeNoChange => "SAFE: Application state did not change.".to_string(),
        Verdict::FailedAllError(status) => format!(
            "ATTACK FAILED (SAFE)\n\n\
             All {} requests failed with status {}.\n\n\
             No race condition possible if requests are invalid.\n\
             Advice: Check your request body, headers, or cookies.",
            evidence.successes, status
        ),
        Verdict::Unstable => {
            "UNSTABLE RESULTS\n\nMixed error codes received. No clear conclusion.".to_string()
        }
        Verdict::SafeSingleSuccess => "SAFE: Only 1 request succeeded.".to_string(),
        Verdict::HighVariation => format!(
            "HIGH RISK DETECTED (VARIATION)\n\n\
             Multiple requests succeeded ({}) and returned DIFFERENT content.\n\
             This implies the server processed them distinctly.\n\
             Manual verification recommended.",
            evidence.successes
        ),
        Verdict::MediumIdempotentSuspected => format!(
            "MEDIUM RISK (POTENTIAL IDEMPOTENCY)\n\n\
             Multiple requests succeeded ({}) but returned IDENTICAL content.\n\
             This is likely safe (idempotent overwrites), but verify manually.",
            evidence.successes
        ),
    }
}

pub struct DifferentialAnalyzer;

impl DifferentialAnalyzer {
    pub fn analyze(
        outcomes: &[BurstOutcome],
        pre_probe: Option<&ProbeResult>,
        post_probe: Option<&ProbeResult>,
    ) -> Analysis {
        let probes = match (pre_probe, post_probe) {
            (Some(pre), Some(post)) => Some((pre, post)),
            _ => None,
        };

        let baseline_status = match select_baseline_status(outcomes) {
            Some(status) => status,
            None => {
                warn!("Error: No responses received.");
                let evidence = Evidence {
                    total: 0,
                    successes: 0,
                    unique_hashes: 0,
                    baseline_status: 0,
                    is_error_baseline: false,
                    probes,
                };
                let verdict = evaluate(&evidence);
                return Analysis {
                    verdict,
                    message: explain(&verdict, &evidence),
                    baseline: None,
                    total_responses: 0,
                    total_baseline_successes: 0,
                    unique_hashes_among_baseline: 0,
                    probe_diff: probes.map(|_| evidence.diff()),
                    rows: Vec::new(),
                };
            }
        };

        let hashes: Vec<String> = outcomes.iter().map(|o| o.fingerprint()).collect();
        let reference = outcomes
            .iter()
            .position(|o| o.status() == baseline_status)
            .unwrap_or(0);
        let baseline = Baseline {
            status: baseline_status,
            hash: hashes[reference].clone(),
            is_error: baseline_status >= 400,
        };

        let baseline_hashes: Vec<&String> = outcomes
            .iter()
            .zip(&hashes)
            .filter(|(o, _)| o.status() == baseline_status)
            .map(|(_, h)| h)
            .collect();
        let successes = baseline_hashes.len();
        let unique_hashes = baseline_hashes.iter().collect::<HashSet<_>>().len();

        let rows = outcomes
            .iter()
            .zip(&hashes)
            .enumerate()
            .map(|(i, (outcome, hash))| {
                let note = if outcome.status() != baseline_status {
                    RowNote::Code(outcome.status())
                } else if *hash == baseline.hash {
                    RowNote::ExactMatch
                } else {
                    RowNote::DifferentBody
                };
                ResultRow {
                    index: i + 1,
                    status: outcome.status(),
                    body_length: outcome.body_length(),
                    short_hash: short_fingerprint(hash),
                    note,
                    http_version: outcome.http_version().to_string(),
                }
            })
            .collect();

        let evidence = Evidence {
            total: outcomes.len(),
            successes,
            unique_hashes,
            baseline_status,
            is_error_baseline: baseline.is_error,
            probes,
        };

        if let Some((pre, post)) = probes {
            info!("    > Probe Analysis: {} -> {}", pre, post);
            if pre.is_error || post.is_error {
                warn!("Probe error. Fallback to standard analysis.");
            }
        }

        let verdict = evaluate(&evidence);
        Analysis {
            verdict,
            message: explain(&verdict, &evidence),
            total_responses: outcomes.len(),
            total_baseline_successes: successes,
            unique_hashes_among_baseline: unique_hashes,
            probe_diff: probes.map(|_| evidence.diff()),
            baseline: Some(baseline),
            rows,
        }
    }
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
