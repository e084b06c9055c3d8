// File: request.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::{RaceError, RaceResult};
use log::debug;
use serde::Serialize;
use std::fmt;
use url::Url;

const DEFAULT_SECURE_PORT: u16 = 443;

/// Where a request is sent: host, port and whether TLS is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpService {
    host: String,
    port: u16,
    secure: bool,
}

impl HttpService {
    pub fn new(host: &str, port: u16, secure: bool) -> Self {
        Self {
            host: host.to_string(),
            port,
            secure,
        }
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            _ => return None,
        };
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port, secure))
    }

    /// Rebuilds a destination from a `Host` header value. TLS on port 443 is
    /// assumed unless the header names another port; port 80 means plain HTTP.
    pub fn from_host_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        let (host, port) = if let Some(rest) = value.strip_prefix('[') {
            let (addr, tail) = rest.split_once(']')?;
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_SECURE_PORT);
            (format!("[{}]", addr), port)
        } else {
            match value.split_once(':') {
                Some((host, port)) => (
                    host.to_string(),
                    port.parse::<u16>().unwrap_or(DEFAULT_SECURE_PORT),
                ),
                None => (value.to_string(), DEFAULT_SECURE_PORT),
            }
        };

        if host.is_empty() {
            return None;
        }
        Some(Self::new(&host, port, port != 80))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let default_port = if self.secure { 443 } else { 80 };
        if self.port == default_port {
            format!("{}://{}", scheme, self.host)
        } else {
            format!("{}://{}:{}", scheme, self.host, self.port)
        }
    }
}

impl fmt::Display for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

/// A frozen HTTP request: method, origin-form target, ordered headers and a
/// raw body, plus the service it is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    service: Option<HttpService>,
}

impl TargetRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            headers: Vec::new(),
            body: Vec::new(),
            service: None,
        }
    }

    pub fn from_url(method: &str, url: &str) -> RaceResult<Self> {
        let parsed = Url::parse(url)?;
        let service = HttpService::from_url(&parsed).ok_or_else(|| {
            RaceError::InvalidRequest(format!("Unsupported URL: {}", url))
        })?;
        let mut target = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            target.push('?');
            target.push_str(query);
        }

        let host_header = match parsed.port() {
            Some(port) => format!("{}:{}", service.host(), port),
            None => service.host().to_string(),
        };

        Ok(Self::new(method, &target)
            .with_header("Host", &host_header)
            .with_service(service))
    }

    /// Parses a raw HTTP/1.x request as saved from an intercepting proxy:
    /// request line, header lines, an empty line and the verbatim body.
    pub fn parse_raw(raw: &[u8]) -> RaceResult<Self> {
        let (head, body) = split_head_and_body(raw);
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines().skip_while(|l| l.trim().is_empty());

        let request_line = lines
            .next()
            .ok_or_else(|| RaceError::InvalidRequest("Empty request".to_string()))?;
        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| RaceError::InvalidRequest("Missing method".to_string()))?;
        let target = parts.next().ok_or_else(|| {
            RaceError::InvalidRequest(format!("Malformed request line: {}", request_line))
        })?;

        let mut request = if target.starts_with("http://") || target.starts_with("https://") {
            let absolute = Self::from_url(method, target)?;
            Self {
                headers: Vec::new(),
                ..absolute
            }
        } else {
            Self::new(method, target)
        };

        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    request.headers.push((name.trim().to_string(), value.trim().to_string()))
                }
                None => debug!("Skipping malformed header line: {}", line),
            }
        }

        request.body = body.to_vec();
        Ok(request)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn service(&self) -> Option<&HttpService> {
        self.service.as_ref()
    }

    pub fn has_destination(&self) -> bool {
        self.service.is_some()
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_service(mut self, service: HttpService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_removed_header(mut self, name: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    /// Replaces every header called `name` with a single `name: value`.
    pub fn with_header(self, name: &str, value: &str) -> Self {
        let mut request = self.with_removed_header(name);
        request.headers.push((name.to_string(), value.to_string()));
        request
    }

    /// Sets `Content-Length` to the real body size. Bodyless requests that
    /// never carried the header are left alone.
    pub fn with_fixed_content_length(self) -> Self {
        if self.body.is_empty() && self.header("Content-Length").is_none() {
            return self;
        }
        let length = self.content_length().to_string();
        self.with_header("Content-Length", &length)
    }

    /// Fills in a missing destination, first from `fallback`, then from the
    /// `Host` header.
    pub fn with_recovered_service(self, fallback: Option<&HttpService>) -> Self {
        if self.service.is_some() {
            return self;
        }
        if let Some(service) = fallback {
            return self.with_service(service.clone());
        }
        match self.header("Host").and_then(HttpService::from_host_header) {
            Some(service) => {
                debug!("Recovered destination {} from Host header", service);
                self.with_service(service)
            }
            None => self,
        }
    }

    pub fn url(&self) -> RaceResult<Url> {
        let service = self.service.as_ref().ok_or_else(|| {
            RaceError::Configuration("Request has no HTTP service (host/port)".to_string())
        })?;
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        Ok(Url::parse(&format!("{}{}", service.base_url(), path))?)
    }
}

impl fmt::Display for TargetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            Some(service) => write!(f, "{} {}{}", self.method, service, self.path),
            None => write!(f, "{} {} (no service)", self.method, self.path),
        }
    }
}

fn split_head_and_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let crlf = find_subslice(raw, b"\r\n\r\n").map(|pos| (pos, 4));
    let lf = find_subslice(raw, b"\n\n").map(|pos| (pos, 2));
    let separator = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match separator {
        Some((pos, len)) => (&raw[..pos], &raw[pos + len..]),
        None => (raw, &[]),
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
