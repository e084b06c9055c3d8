// File: transport.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::{RaceError, RaceResult};
use crate::outcome::BurstOutcome;
use crate::request::TargetRequest;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::time::Duration;

// Managed by the client itself; forwarding them breaks HTTP/2.
const SKIPPED_HEADERS: &[&str] = &[
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
    "proxy-connection",
    "upgrade",
];

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TargetRequest) -> RaceResult<BurstOutcome>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Idle connections are not kept: burst workers run on their own runtime
    /// and every request opens a fresh connection.
    pub fn new(timeout_secs: u64, allow_http2: bool) -> RaceResult<Self> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0);
        if !allow_http2 {
            builder = builder.http1_only();
        }
        let client = builder.build()?;
        Ok(ReqwestTransport {
            client,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    fn build_headers(request: &TargetRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in request.headers() {
            if SKIPPED_HEADERS.iter().any(|s| name.eq_ignore_ascii_case(s)) {
                continue;
            }
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => log::debug!("Dropping unsendable header {}", name),
            }
        }
        headers
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TargetRequest) -> RaceResult<BurstOutcome> {
        let url = request.url()?;
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| RaceError::InvalidRequest(format!("Bad method: {}", e)))?;

        let response = self
            .client
            .request(method, url)
            .headers(Self::build_headers(request))
            .body(request.body().to_vec())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let http_version = format!("{:?}", response.version());
        let body = response.bytes().await?;
        Ok(BurstOutcome::new(status, body.to_vec(), &http_version))
    }
}
