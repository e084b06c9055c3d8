// File: outcome.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::fingerprint::fingerprint;

/// One response collected during a burst (or by a probe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstOutcome {
    status: u16,
    body: Vec<u8>,
    http_version: String,
}

impl BurstOutcome {
    pub fn new(status: u16, body: Vec<u8>, http_version: &str) -> Self {
        BurstOutcome {
            status,
            body,
            http_version: http_version.to_string(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_length(&self) -> usize {
        self.body.len()
    }

    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.body)
    }
}
