// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait used to persist the session across restarts.

use async_trait::async_trait;

use crate::error::SatchelError;
use crate::traits::adapter::Adapter;

/// A process-wide string key-value store.
#[async_trait]
pub trait KeyValueStore: Adapter {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, SatchelError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), SatchelError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), SatchelError>;
}
