// File: probe.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::fingerprint::{fingerprint, short_fingerprint};
use crate::matcher::OccurrenceCounter;
use crate::request::TargetRequest;
use crate::transport::Transport;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const NO_SERVICE: &str = "[Error: No Service]";
pub const PROBE_ERROR: &str = "[Error]";
pub const NO_MATCH: &str = "[No Match]";

/// Application state observed by one probe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub value: String,
    pub count: i64,
    pub is_error: bool,
}

impl ProbeResult {
    pub fn new(value: &str, count: i64, is_error: bool) -> Self {
        ProbeResult {
            value: value.to_string(),
            count,
            is_error,
        }
    }

    pub fn no_service() -> Self {
        Self::new(NO_SERVICE, 0, true)
    }

    pub fn error() -> Self {
        Self::new(PROBE_ERROR, 0, true)
    }

    pub fn no_match() -> Self {
        Self::new(NO_MATCH, 0, false)
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Count: {})", self.value, self.count)
    }
}

pub fn truncate(value: &str) -> String {
    match value.char_indices().nth(30) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

pub struct ProbeExecutor {
    transport: Arc<dyn Transport>,
    counter: OccurrenceCounter,
}

impl ProbeExecutor {
    pub fn new(transport: Arc<dyn Transport>, match_input: &str) -> Self {
        Self {
            transport,
            counter: OccurrenceCounter::new(match_input),
        }
    }

    /// Label for what the probe counts, `HASH` when no match input is set.
    pub fn counting(&self) -> &str {
        if self.counter.is_empty() {
            "HASH"
        } else {
            self.counter.input()
        }
    }

    pub async fn execute(&self, probe: Option<&TargetRequest>) -> ProbeResult {
        let probe = match probe {
            Some(probe) if probe.has_destination() => probe,
            _ => return ProbeResult::no_service(),
        };

        let response = match self.transport.send(probe).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Probe Error: {}", e);
                return ProbeResult::error();
            }
        };
        info!("[Probe] Body Len: {}", response.body_length());

        if self.counter.is_empty() {
            let hash = short_fingerprint(&fingerprint(response.body()));
            let count = if response.body().is_empty() { 0 } else { 1 };
            return ProbeResult::new(&hash, count, false);
        }

        match self.counter.find(&response.body_text()) {
            Some(found) => {
                info!("[Probe] {} Match Found. Count: {}", found.strategy, found.count);
                ProbeResult::new(&found.value, found.count as i64, false)
            }
            None => {
                debug!("[Probe] Not Found.");
                ProbeResult::no_match()
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
