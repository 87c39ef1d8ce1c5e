// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for the refresh pipeline.
//!
//! `TestHarness` wires a [`SessionSync`] to a [`MockSessionSource`], a
//! [`MemoryKvStore`], and a [`ManualClock`], and keeps handles to all three
//! so tests can script the backend and inspect persisted state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use satchel_core::{AuthToken, SessionRecord};
use satchel_session::{ManualClock, RefreshPolicy, SessionPersistence, SessionSync};

use crate::memory_kv::MemoryKvStore;
use crate::mock_source::MockSessionSource;

/// Fixed start time for every harness clock.
pub const HARNESS_START: &str = "2026-03-01T08:00:00Z";

pub struct TestHarness {
    pub sync: Arc<SessionSync>,
    pub source: Arc<MockSessionSource>,
    pub kv: Arc<MemoryKvStore>,
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    /// Harness with a five minute freshness window and nobody signed in.
    pub fn new() -> Self {
        Self::with_source(MockSessionSource::new())
    }

    pub fn with_source(source: MockSessionSource) -> Self {
        let source = Arc::new(source);
        let kv = Arc::new(MemoryKvStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let sync = SessionSync::new(source.clone(), RefreshPolicy::new(Duration::from_secs(300)))
            .with_persistence(SessionPersistence::new(kv.clone()))
            .with_clock(clock.clone());
        Self {
            sync: Arc::new(sync),
            source,
            kv,
            clock,
        }
    }

    /// Signs in with token `"test-token"` and the given login payload.
    pub async fn signed_in(record: Option<SessionRecord>) -> Self {
        let harness = Self::new();
        harness
            .sync
            .login(AuthToken::new("test-token"), record)
            .await
            .expect("login with a non-blank token");
        harness
    }

    pub fn now(&self) -> DateTime<Utc> {
        use satchel_session::Clock;
        self.clock.now()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(HARNESS_START)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_default()
}
