// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the backend client, session database, and refresh pipeline.

use std::sync::Arc;

use satchel_api::ApiClient;
use satchel_config::model::SatchelConfig;
use satchel_core::{Adapter, HealthStatus, SatchelError};
use satchel_session::{RefreshPolicy, SessionPersistence, SessionSync};
use satchel_storage::SqliteKvStore;
use tracing::{debug, warn};

pub struct App {
    pub api: Arc<ApiClient>,
    pub sync: Arc<SessionSync>,
    kv: Arc<SqliteKvStore>,
}

impl App {
    /// Builds the stack and restores the persisted session.
    pub async fn open(config: &SatchelConfig) -> Result<Self, SatchelError> {
        let api = Arc::new(ApiClient::new(&config.api)?);
        let kv = Arc::new(SqliteKvStore::open(&config.storage.database_path).await?);

        let sync = SessionSync::new(api.clone(), RefreshPolicy::from_config(&config.refresh))
            .with_persistence(SessionPersistence::new(kv.clone()));
        let restored = sync.restore().await;
        debug!(restored, database = %kv.path(), "session pipeline ready");

        Ok(Self {
            api,
            sync: Arc::new(sync),
            kv,
        })
    }

    /// Logs the health of both adapters. Never fails.
    pub async fn log_health(&self) {
        let adapters: [&dyn Adapter; 2] = [self.api.as_ref(), self.kv.as_ref()];
        for adapter in adapters {
            match adapter.health_check().await {
                Ok(HealthStatus::Healthy) => {
                    debug!(adapter = adapter.name(), version = %adapter.version(), "adapter healthy");
                }
                Ok(status) => {
                    warn!(adapter = adapter.name(), ?status, "adapter not healthy");
                }
                Err(e) => {
                    warn!(adapter = adapter.name(), error = %e, "adapter health check failed");
                }
            }
        }
    }
}
