// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use log::{error, info};
use racestate::cli::Cli;
use racestate::errors::RaceError;
use racestate::orchestrator::RaceAuditor;
use racestate::report::{ConsoleReporter, RunReport};
use racestate::request::TargetRequest;
use racestate::transport::ReqwestTransport;
use simple_logger::SimpleLogger;
use std::path::Path;
use std::sync::Arc;

fn load_request(path: &Path) -> Result<TargetRequest> {
    let raw = std::fs::read(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    TargetRequest::parse_raw(&raw)
        .with_context(|| format!("Failed to parse request file {}", path.display()))
}

fn build_target(cli: &Cli) -> Result<TargetRequest> {
    let target = match (&cli.request_file, &cli.url) {
        (Some(path), _) => load_request(path)?,
        (None, Some(url)) => TargetRequest::from_url(&cli.method, url)?,
        (None, None) => bail!("Either --request or --url is required"),
    };
    Ok(match &cli.data {
        Some(data) => target.with_body(data.as_bytes().to_vec()),
        None => target,
    })
}

fn build_probe(cli: &Cli) -> Result<Option<TargetRequest>> {
    if let Some(path) = &cli.probe_file {
        return load_request(path).map(Some);
    }
    match &cli.probe_url {
        Some(url) => Ok(Some(TargetRequest::from_url("GET", url)?)),
        None => Ok(None),
    }
}

fn confirm_authorization(cli: &Cli) -> Result<bool> {
    println!(
        "{}",
        "WARNING: this tool sends a concurrent burst of state-changing requests."
            .bright_red()
            .bold()
    );
    println!("   You MUST have explicit written authorization to test the target.");
    println!();

    if cli.i_have_authorization {
        return Ok(true);
    }

    println!(
        "{}",
        "Do you have explicit written authorization to test the target system? (yes/NO):"
            .bright_yellow()
    );
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    if input.trim().to_lowercase() != "yes" {
        println!("{}", "Authorization not confirmed. Exiting for safety.".red());
        println!("   Use --i-have-authorization flag only if you have proper authorization.");
        return Ok(false);
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(cli.level_filter())
        .init()
        .context("Failed to initialise logger")?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    if !confirm_authorization(&cli)? {
        return Ok(());
    }

    let target = build_target(&cli)?;
    let probe = build_probe(&cli)?;
    let config = cli.run_config();

    let transport = Arc::new(ReqwestTransport::new(
        config.request_timeout(),
        config.use_pooled_strategy(),
    )?);
    let auditor = Arc::new(
        RaceAuditor::new(transport, Arc::new(ConsoleReporter::new()), config)
            .with_progress(cli.show_progress()),
    );

    let interrupt = {
        let auditor = Arc::clone(&auditor);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                auditor.stop();
            }
        })
    };

    let result = auditor.run(target, probe).await;
    interrupt.abort();
    auditor.shutdown();

    let run = match result {
        Ok(run) => run,
        Err(RaceError::Cancelled) => {
            info!("Run cancelled, no verdict produced");
            return Ok(());
        }
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let report = RunReport::new(
        &run.target,
        &run.strategy.to_string(),
        &run.analysis,
        run.pre_probe.as_ref(),
        run.post_probe.as_ref(),
    );
    if let Some(path) = &cli.output {
        report
            .write_json(&path.to_string_lossy())
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        info!("JSON report written to {}", path.display());
    }
    if let Some(path) = &cli.text_output {
        report
            .write_text(&path.to_string_lossy())
            .with_context(|| format!("Failed to write text report to {}", path.display()))?;
        info!("Text report written to {}", path.display());
    }

    Ok(())
}
