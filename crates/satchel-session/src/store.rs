// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer, multi-reader session store.
//!
//! [`SessionStore`] owns the `watch` sender and is the only handle that can
//! change session state; its mutators are crate-private so the refresh
//! pipeline is the sole writer. Any number of [`SessionReader`]s observe it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use satchel_core::{AuthToken, SessionRecord};
use tokio::sync::watch;

/// Authentication and freshness bookkeeping for the current session.
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    /// Set only when a validated refresh is accepted; cleared on logout.
    pub last_updated_at: Option<DateTime<Utc>>,
    pub is_authenticated: bool,
    pub token: Option<AuthToken>,
}

impl RefreshState {
    /// True when authenticated with a non-blank token.
    pub fn is_signed_in(&self) -> bool {
        self.is_authenticated && self.token.as_ref().is_some_and(|t| !t.is_blank())
    }
}

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub record: Option<Arc<SessionRecord>>,
    pub refresh: RefreshState,
}

/// The writer half of the session store.
pub struct SessionStore {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx }
    }

    /// Returns a new reader observing this store.
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Starts a session from a login payload. The record is stored as given,
    /// even if incomplete; `last_updated_at` stays unset until a refresh is
    /// accepted.
    pub(crate) fn sign_in(&self, token: AuthToken, record: Option<SessionRecord>) {
        self.tx.send_replace(SessionSnapshot {
            record: record.map(Arc::new),
            refresh: RefreshState {
                last_updated_at: None,
                is_authenticated: true,
                token: Some(token),
            },
        });
    }

    /// Seeds the store from persisted state at startup.
    pub(crate) fn restore(
        &self,
        token: AuthToken,
        record: Option<SessionRecord>,
        last_updated_at: Option<DateTime<Utc>>,
    ) {
        self.tx.send_replace(SessionSnapshot {
            record: record.map(Arc::new),
            refresh: RefreshState {
                last_updated_at,
                is_authenticated: true,
                token: Some(token),
            },
        });
    }

    /// Replaces the record wholesale and stamps `last_updated_at`.
    ///
    /// Only applies while the session that issued the fetch is still the
    /// current one: `fetched_with` must match the stored token. Returns
    /// whether the write happened.
    pub(crate) fn replace_record(
        &self,
        fetched_with: &AuthToken,
        record: SessionRecord,
        now: DateTime<Utc>,
    ) -> bool {
        self.tx.send_if_modified(|snapshot| {
            let same_session = snapshot.refresh.is_signed_in()
                && snapshot
                    .refresh
                    .token
                    .as_ref()
                    .is_some_and(|t| t.expose() == fetched_with.expose());
            if !same_session {
                return false;
            }
            snapshot.record = Some(Arc::new(record));
            snapshot.refresh.last_updated_at = Some(now);
            true
        })
    }

    /// Ends the session: drops record and token, resets `last_updated_at`.
    pub(crate) fn clear(&self) {
        self.tx.send_replace(SessionSnapshot::default());
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A read-only, cloneable view of the session store.
#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionReader {
    /// The current record, if any.
    pub fn record(&self) -> Option<Arc<SessionRecord>> {
        self.rx.borrow().record.clone()
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.rx.borrow().refresh.clone()
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.rx.borrow().refresh.last_updated_at
    }

    pub fn is_signed_in(&self) -> bool {
        self.rx.borrow().refresh.is_signed_in()
    }

    pub fn snapshot(&mut self) -> SessionSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Waits for the next store update. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
