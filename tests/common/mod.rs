// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use racestate::config::RunConfig;
use racestate::orchestrator::RaceAuditor;
use racestate::report::CollectingReporter;
use racestate::transport::ReqwestTransport;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_mock_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_string(body)
        .append_header("content-type", "text/plain")
}

pub async fn mount_endpoint(server: &MockServer, verb: &str, route: &str, status: u16, body: &str) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(create_mock_response(status, body))
        .mount(server)
        .await;
}

/// Answers the first probe with `before`, every later one with `after`.
pub async fn mount_changing_probe(server: &MockServer, route: &str, before: &str, after: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(create_mock_response(200, before))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(create_mock_response(200, after))
        .mount(server)
        .await;
}

pub fn fast_config(workers: usize) -> RunConfig {
    let mut config = RunConfig::new();
    config.set_worker_count(workers);
    config.set_stabilization_delay_ms(50);
    config.set_finish_timeout_ms(5_000);
    config.set_post_burst_settle_ms(50);
    config.set_request_timeout(5);
    config
}

pub fn create_auditor(config: RunConfig) -> (RaceAuditor, Arc<CollectingReporter>) {
    let transport = Arc::new(
        ReqwestTransport::new(config.request_timeout(), config.use_pooled_strategy())
            .expect("transport"),
    );
    let reporter = Arc::new(CollectingReporter::new());
    let auditor = RaceAuditor::new(transport, reporter.clone(), config);
    (auditor, reporter)
}
