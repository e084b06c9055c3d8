// File: fingerprint.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

/// Lowercase hex MD5 of a response body. Only used for equality checks.
pub fn fingerprint(body: &[u8]) -> String {
    format!("{:x}", md5::compute(body))
}

/// First eight hex characters followed by `...`, as shown in result rows.
pub fn short_fingerprint(hash: &str) -> String {
    match hash.get(..8) {
        Some(prefix) => format!("{}...", prefix),
        None => hash.to_string(),
    }
}
