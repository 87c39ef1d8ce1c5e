// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`KeyValueStore`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::params;
use satchel_core::{Adapter, AdapterType, HealthStatus, KeyValueStore, SatchelError};
use tracing::{debug, info};

use crate::migrations;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-value store over a single `tokio_rusqlite::Connection`.
///
/// Do NOT open a second connection to the same file for writes.
pub struct SqliteKvStore {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl SqliteKvStore {
    /// Opens (creating if needed) the database at `path`, enables WAL mode,
    /// and applies pending migrations.
    pub async fn open(path: &str) -> Result<Self, SatchelError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(SatchelError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(SatchelError::storage)?;

        conn.call(|conn| -> Result<Result<(), SatchelError>, rusqlite::Error> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get(0)
            })?;
            debug!(journal_mode = %mode, "sqlite pragmas applied");
            Ok(migrations::run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        info!(path = %path, "session storage opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// Returns the database file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Closes the connection, flushing the background thread.
    pub async fn close(self) -> Result<(), SatchelError> {
        self.conn.close().await.map_err(SatchelError::storage)
    }
}

#[async_trait]
impl Adapter for SqliteKvStore {
    fn name(&self) -> &str {
        "sqlite-kv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::KeyValueStore
    }

    async fn health_check(&self) -> Result<HealthStatus, SatchelError> {
        let result = self
            .conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))
            })
            .await;
        match result {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SatchelError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SatchelError> {
        let key = key.to_string();
        let value = value.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO kv_entries (key, value, updated_at)
                     VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![key, value],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, key: &str) -> Result<(), SatchelError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert tokio-rusqlite errors to SatchelError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SatchelError {
    SatchelError::storage(e)
}
