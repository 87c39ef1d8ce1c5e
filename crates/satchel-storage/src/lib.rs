// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Satchel session core.
//!
//! Provides a WAL-mode SQLite key-value store with embedded migrations.
//! All statements run on `tokio-rusqlite`'s single background thread, so
//! the store is the only writer to its database file.

pub mod kv;
pub mod migrations;

pub use kv::SqliteKvStore;
