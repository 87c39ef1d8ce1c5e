// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock session source for deterministic testing.
//!
//! Responses are popped from a FIFO queue. Each can carry a delay, which
//! lets tests complete overlapping fetches out of order. When the queue is
//! empty the default payload is returned, or a transport error if none is set.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use satchel_core::{
    Adapter, AdapterType, AuthToken, HealthStatus, SatchelError, SessionPayload, SessionSource,
};

struct Scripted {
    result: Result<SessionPayload, SatchelError>,
    delay: Option<Duration>,
}

pub struct MockSessionSource {
    queue: Mutex<VecDeque<Scripted>>,
    default: Option<SessionPayload>,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl MockSessionSource {
    /// Create a mock with an empty queue and no default.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: None,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that answers with `payload` whenever the queue is empty.
    pub fn with_default(payload: SessionPayload) -> Self {
        Self {
            default: Some(payload),
            ..Self::new()
        }
    }

    pub fn push_ok(&self, payload: SessionPayload) {
        self.push(Ok(payload), None);
    }

    pub fn push_err(&self, err: SatchelError) {
        self.push(Err(err), None);
    }

    /// Queue a payload that is returned only after `delay` has elapsed.
    pub fn push_delayed(&self, payload: SessionPayload, delay: Duration) {
        self.push(Ok(payload), Some(delay));
    }

    fn push(&self, result: Result<SessionPayload, SatchelError>, delay: Option<Duration>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted { result, delay });
    }

    /// Number of fetches started so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tokens presented by each fetch, in call order.
    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl Default for MockSessionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for MockSessionSource {
    fn name(&self) -> &str {
        "mock-session-source"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionSource
    }

    async fn health_check(&self) -> Result<HealthStatus, SatchelError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SessionSource for MockSessionSource {
    async fn fetch_session(&self, token: &AuthToken) -> Result<SessionPayload, SatchelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.expose().to_string());

        let next = self.queue.lock().unwrap().pop_front();
        let Some(scripted) = next else {
            return match &self.default {
                Some(payload) => Ok(payload.clone()),
                None => Err(SatchelError::Transport {
                    message: "no scripted response".to_string(),
                    source: None,
                }),
            };
        };

        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }
}
