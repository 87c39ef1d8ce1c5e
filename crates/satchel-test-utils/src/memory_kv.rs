// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key-value store.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use satchel_core::{Adapter, AdapterType, HealthStatus, KeyValueStore, SatchelError};

/// A `KeyValueStore` backed by a map. `set_failing(true)` makes every
/// operation return a storage error; `set_write_delay` slows down writes.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
    failing: AtomicBool,
    write_delay: Mutex<Duration>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every `set` and `remove` sleeps for `delay` before applying.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), SatchelError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SatchelError::storage(std::io::Error::other(
                "injected storage failure",
            )));
        }
        Ok(())
    }

    async fn slow_write(&self) {
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Adapter for MemoryKvStore {
    fn name(&self) -> &str {
        "memory-kv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::KeyValueStore
    }

    async fn health_check(&self) -> Result<HealthStatus, SatchelError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("injected failure".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SatchelError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SatchelError> {
        self.slow_write().await;
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SatchelError> {
        self.slow_write().await;
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
