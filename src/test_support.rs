// File: test_support.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::{RaceError, RaceResult};
use crate::outcome::BurstOutcome;
use crate::request::{HttpService, TargetRequest};
use crate::transport::Transport;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Answers every request from a queue of scripted replies; when the queue
/// runs dry the fallback reply is used.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<RaceResult<BurstOutcome>>>,
    fallback: Option<BurstOutcome>,
    delay: Duration,
    calls: AtomicUsize,
    dispatched: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn always(status: u16, body: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(BurstOutcome::new(status, body.as_bytes().to_vec(), "HTTP/1.1")),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(mut self, replies: Vec<RaceResult<BurstOutcome>>) -> Self {
        self.replies = Mutex::new(replies.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: &TargetRequest) -> RaceResult<BurstOutcome> {
        self.dispatched.lock().unwrap().push(Instant::now());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.replies.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| RaceError::Transport("connection refused".to_string())),
        }
    }
}

pub fn outcome(status: u16, body: &str) -> BurstOutcome {
    BurstOutcome::new(status, body.as_bytes().to_vec(), "HTTP/1.1")
}

pub fn target() -> TargetRequest {
    TargetRequest::new("POST", "/api/redeem")
        .with_header("Host", "shop.test")
        .with_body("code=WELCOME10")
        .with_service(HttpService::new("shop.test", 443, true))
}
