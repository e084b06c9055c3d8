// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_STABILIZATION_DELAY_MS: u64 = 300;
pub const DEFAULT_FINISH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_POST_BURST_SETTLE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct RunConfig {
    worker_count: usize,
    stabilization_delay_ms: u64,
    finish_timeout_ms: u64,
    post_burst_settle_ms: u64,
    use_pooled_strategy: bool,
    match_input: String,
    request_timeout: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self {
            worker_count: DEFAULT_WORKERS,
            stabilization_delay_ms: DEFAULT_STABILIZATION_DELAY_MS,
            finish_timeout_ms: DEFAULT_FINISH_TIMEOUT_MS,
            post_burst_settle_ms: DEFAULT_POST_BURST_SETTLE_MS,
            use_pooled_strategy: false,
            match_input: String::new(),
            request_timeout: 10,
        }
    }

    pub fn set_worker_count(&mut self, worker_count: usize) {
        self.worker_count = worker_count.max(1);
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn set_stabilization_delay_ms(&mut self, delay: u64) {
        self.stabilization_delay_ms = delay;
    }

    pub fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_delay_ms)
    }

    pub fn set_finish_timeout_ms(&mut self, timeout: u64) {
        self.finish_timeout_ms = timeout;
    }

    pub fn finish_timeout(&self) -> Duration {
        Duration::from_millis(self.finish_timeout_ms)
    }

    pub fn set_post_burst_settle_ms(&mut self, settle: u64) {
        self.post_burst_settle_ms = settle;
    }

    pub fn post_burst_settle(&self) -> Duration {
        Duration::from_millis(self.post_burst_settle_ms)
    }

    pub fn set_use_pooled_strategy(&mut self, pooled: bool) {
        self.use_pooled_strategy = pooled;
    }

    pub fn use_pooled_strategy(&self) -> bool {
        self.use_pooled_strategy
    }

    /// Stored trimmed; an empty input switches probes to body hashing.
    pub fn set_match_input(&mut self, input: &str) {
        self.match_input = input.trim().to_string();
    }

    pub fn match_input(&self) -> &str {
        &self.match_input
    }

    pub fn set_request_timeout(&mut self, timeout: u64) {
        self.request_timeout = timeout;
    }

    pub fn request_timeout(&self) -> u64 {
        self.request_timeout
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
