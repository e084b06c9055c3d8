// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::{
    RunConfig, DEFAULT_FINISH_TIMEOUT_MS, DEFAULT_POST_BURST_SETTLE_MS,
    DEFAULT_STABILIZATION_DELAY_MS, DEFAULT_WORKERS,
};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[arg(
        short = 'r',
        long = "request",
        help = "Raw HTTP request file to fire concurrently",
        required_unless_present = "url",
        conflicts_with = "url"
    )]
    pub request_file: Option<PathBuf>,

    #[arg(short = 'u', long = "url", help = "Target URL when no raw request is given")]
    pub url: Option<String>,

    #[arg(short = 'X', long = "method", default_value = "POST")]
    pub method: String,

    #[arg(short = 'd', long = "data", help = "Request body used together with --url")]
    pub data: Option<String>,

    #[arg(
        short = 'p',
        long = "probe",
        help = "Raw HTTP request file observing the application state",
        conflicts_with = "probe_url"
    )]
    pub probe_file: Option<PathBuf>,

    #[arg(long = "probe-url", help = "GET URL observing the application state")]
    pub probe_url: Option<String>,

    #[arg(
        short = 'm',
        long = "match",
        default_value = "",
        help = "Text or regex counted in the probe response (empty: body hash)"
    )]
    pub match_input: String,

    #[arg(short = 'w', long = "workers", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    #[arg(long = "stabilization-ms", default_value_t = DEFAULT_STABILIZATION_DELAY_MS)]
    pub stabilization_ms: u64,

    #[arg(long = "finish-timeout-ms", default_value_t = DEFAULT_FINISH_TIMEOUT_MS)]
    pub finish_timeout_ms: u64,

    #[arg(long = "settle-ms", default_value_t = DEFAULT_POST_BURST_SETTLE_MS)]
    pub settle_ms: u64,

    #[arg(
        long = "pooled",
        visible_alias = "http2",
        help = "Dispatch from the shared runtime and allow HTTP/2 multiplexing"
    )]
    pub pooled: bool,

    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 10,
        help = "HTTP request timeout in seconds"
    )]
    pub timeout: u64,

    #[arg(short = 'o', long = "output", help = "Write a JSON report to this file")]
    pub output: Option<PathBuf>,

    #[arg(long = "text-output", help = "Write a plain text report to this file")]
    pub text_output: Option<PathBuf>,

    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Reduce output verbosity")]
    pub quiet: bool,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,

    #[arg(long = "no-progress", help = "Hide the burst progress bar")]
    pub no_progress: bool,

    #[arg(
        long = "i-have-authorization",
        help = "Skip authorization prompt (requires explicit written permission)"
    )]
    pub i_have_authorization: bool,
}

impl Cli {
    /// `--verbose` and `--quiet` win over `--log-level`.
    pub fn level_filter(&self) -> LevelFilter {
        if self.verbose {
            return LevelFilter::Debug;
        }
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.log_level.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }

    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new();
        config.set_worker_count(self.workers);
        config.set_stabilization_delay_ms(self.stabilization_ms);
        config.set_finish_timeout_ms(self.finish_timeout_ms);
        config.set_post_burst_settle_ms(self.settle_ms);
        config.set_use_pooled_strategy(self.pooled);
        config.set_match_input(&self.match_input);
        config.set_request_timeout(self.timeout);
        config
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}
