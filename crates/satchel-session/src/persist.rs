// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence across process restarts.
//!
//! The session lives under three keys in the key-value store. Failures are
//! reported to the caller, which logs and absorbs them; a persisted record
//! that no longer decodes is discarded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use satchel_core::{AuthToken, KeyValueStore, SatchelError, SessionRecord};
use tracing::{debug, warn};

pub const RECORD_KEY: &str = "session.record";
pub const TOKEN_KEY: &str = "session.token";
pub const UPDATED_AT_KEY: &str = "session.updated_at";

/// A session as read back from the store at startup.
#[derive(Debug, Clone)]
pub struct PersistedSession {
    pub token: AuthToken,
    pub record: Option<SessionRecord>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct SessionPersistence {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionPersistence {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Reads the persisted session. Returns `None` when no usable token is
    /// stored.
    pub async fn load(&self) -> Result<Option<PersistedSession>, SatchelError> {
        let token = match self.kv.get(TOKEN_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => AuthToken::new(raw),
            _ => {
                debug!("no persisted session token");
                return Ok(None);
            }
        };

        let record = match self.kv.get(RECORD_KEY).await? {
            Some(raw) => match serde_json::from_str::<SessionRecord>(&raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "discarding persisted session record that failed to decode");
                    None
                }
            },
            None => None,
        };

        // A timestamp without a record would mark nothing as fresh.
        let last_updated_at = match (&record, self.kv.get(UPDATED_AT_KEY).await?) {
            (Some(_), Some(raw)) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(e) => {
                    warn!(error = %e, value = %raw, "discarding unparseable session timestamp");
                    None
                }
            },
            _ => None,
        };

        Ok(Some(PersistedSession {
            token,
            record,
            last_updated_at,
        }))
    }

    /// Writes a fresh login. Any previous timestamp is removed.
    pub async fn save_sign_in(
        &self,
        token: &AuthToken,
        record: Option<&SessionRecord>,
    ) -> Result<(), SatchelError> {
        self.kv.set(TOKEN_KEY, token.expose()).await?;
        match record {
            Some(record) => self.kv.set(RECORD_KEY, &encode(record)?).await?,
            None => self.kv.remove(RECORD_KEY).await?,
        }
        self.kv.remove(UPDATED_AT_KEY).await
    }

    /// Writes an accepted record and its timestamp.
    pub async fn save_record(
        &self,
        record: &SessionRecord,
        updated_at: DateTime<Utc>,
    ) -> Result<(), SatchelError> {
        self.kv.set(RECORD_KEY, &encode(record)?).await?;
        self.kv.set(UPDATED_AT_KEY, &updated_at.to_rfc3339()).await
    }

    /// Removes every persisted session key.
    pub async fn clear(&self) -> Result<(), SatchelError> {
        for key in [RECORD_KEY, TOKEN_KEY, UPDATED_AT_KEY] {
            self.kv.remove(key).await?;
        }
        Ok(())
    }
}

fn encode(record: &SessionRecord) -> Result<String, SatchelError> {
    serde_json::to_string(record)
        .map_err(|e| SatchelError::Internal(format!("failed to encode session record: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::UserCategory;
    use satchel_test_utils::MemoryKvStore;

    fn jane() -> SessionRecord {
        SessionRecord {
            id: Some(61),
            full_name: Some("Jane".into()),
            user_category: Some(UserCategory::Parent),
            user_payments: Some(vec![]),
            ..SessionRecord::default()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn persistence() -> (Arc<MemoryKvStore>, SessionPersistence) {
        let kv = Arc::new(MemoryKvStore::new());
        (kv.clone(), SessionPersistence::new(kv))
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let (_, persistence) = persistence();
        assert!(persistence.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_then_record_round_trip() {
        let (_, persistence) = persistence();
        let token = AuthToken::new("abc");
        persistence.save_sign_in(&token, None).await.unwrap();
        persistence.save_record(&jane(), now()).await.unwrap();

        let loaded = persistence.load().await.unwrap().unwrap();
        assert_eq!(loaded.token.expose(), "abc");
        assert_eq!(loaded.record, Some(jane()));
        assert_eq!(loaded.last_updated_at, Some(now()));
    }

    #[tokio::test]
    async fn new_sign_in_drops_old_timestamp() {
        let (_, persistence) = persistence();
        persistence.save_record(&jane(), now()).await.unwrap();
        persistence
            .save_sign_in(&AuthToken::new("abc"), Some(&jane()))
            .await
            .unwrap();
        let loaded = persistence.load().await.unwrap().unwrap();
        assert!(loaded.last_updated_at.is_none());
    }

    #[tokio::test]
    async fn corrupt_record_is_discarded() {
        let (kv, persistence) = persistence();
        kv.set(TOKEN_KEY, "abc").await.unwrap();
        kv.set(RECORD_KEY, "{not json").await.unwrap();
        kv.set(UPDATED_AT_KEY, &now().to_rfc3339()).await.unwrap();

        let loaded = persistence.load().await.unwrap().unwrap();
        assert!(loaded.record.is_none());
        assert!(loaded.last_updated_at.is_none());
    }

    #[tokio::test]
    async fn clear_removes_all_keys() {
        let (kv, persistence) = persistence();
        persistence
            .save_sign_in(&AuthToken::new("abc"), Some(&jane()))
            .await
            .unwrap();
        persistence.clear().await.unwrap();
        assert!(kv.is_empty());
        assert!(persistence.load().await.unwrap().is_none());
    }
}
