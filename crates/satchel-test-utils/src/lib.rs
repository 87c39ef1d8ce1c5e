// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Satchel session tests.
//!
//! Provides scripted adapters and a harness for fast, deterministic tests
//! without a backend or a database.
//!
//! # Components
//!
//! - [`MockSessionSource`] - Session source with scripted, optionally delayed responses
//! - [`MemoryKvStore`] - In-memory key-value store with failure injection
//! - [`TestHarness`] - A wired-up `SessionSync` on top of both

pub mod fixtures;
pub mod harness;
pub mod memory_kv;
pub mod mock_source;

pub use harness::TestHarness;
pub use memory_kv::MemoryKvStore;
pub use mock_source::MockSessionSource;
pub use satchel_session::ManualClock;
