// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The refresh pipeline.
//!
//! [`SessionSync`] owns the [`SessionStore`] and is its only writer. Every
//! trigger runs the same path: policy, fetch, merge guard, persist,
//! payment re-evaluation. Failures are logged and absorbed here; callers
//! only ever see whether the store changed.

use std::sync::Arc;

use satchel_core::{
    AuthToken, PaymentStatus, RefreshTrigger, SatchelError, SessionRecord, SessionSource,
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::guard::{MergeGuard, MergeOutcome, RejectReason};
use crate::payment::evaluate_payment_status;
use crate::persist::SessionPersistence;
use crate::policy::{RefreshDecision, RefreshPolicy, SkipReason};
use crate::store::{SessionReader, SessionStore};

/// What a refresh call did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Skipped(SkipReason),
    Updated,
    Rejected(RejectReason),
}

pub struct SessionSync {
    store: SessionStore,
    policy: RefreshPolicy,
    guard: MergeGuard,
    source: Arc<dyn SessionSource>,
    persistence: Option<SessionPersistence>,
    clock: Arc<dyn Clock>,
    payment_tx: watch::Sender<PaymentStatus>,
    /// Serializes key-value writes so a slow write cannot land after a newer one.
    persist_lock: Mutex<()>,
}

impl SessionSync {
    pub fn new(source: Arc<dyn SessionSource>, policy: RefreshPolicy) -> Self {
        let store = SessionStore::new();
        let initial = {
            let snapshot = store.snapshot();
            evaluate_payment_status(&snapshot.refresh, snapshot.record.as_deref())
        };
        let (payment_tx, _rx) = watch::channel(initial);
        Self {
            store,
            policy,
            guard: MergeGuard::new(),
            source,
            persistence: None,
            clock: Arc::new(SystemClock),
            payment_tx,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn with_persistence(mut self, persistence: SessionPersistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// A read handle on the session store.
    pub fn reader(&self) -> SessionReader {
        self.store.reader()
    }

    /// The most recently evaluated payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_tx.borrow().clone()
    }

    pub fn subscribe_payment_status(&self) -> watch::Receiver<PaymentStatus> {
        self.payment_tx.subscribe()
    }

    /// Seeds the store from the persisted session, if any. Returns whether a
    /// session was restored.
    pub async fn restore(&self) -> bool {
        let Some(persistence) = &self.persistence else {
            return false;
        };

        match persistence.load().await {
            Ok(Some(persisted)) => {
                info!(
                    user_id = ?persisted.record.as_ref().and_then(|r| r.id),
                    has_timestamp = persisted.last_updated_at.is_some(),
                    "restored persisted session"
                );
                self.store
                    .restore(persisted.token, persisted.record, persisted.last_updated_at);
                self.recheck_payment_status();
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "failed to read persisted session, starting signed out");
                false
            }
        }
    }

    /// Starts a session from the authentication payload.
    ///
    /// The record is stored as given; the first refresh after login always
    /// fetches because no freshness timestamp exists yet.
    pub async fn login(
        &self,
        token: AuthToken,
        record: Option<SessionRecord>,
    ) -> Result<(), SatchelError> {
        if token.is_blank() {
            return Err(SatchelError::Unauthorized {
                message: "cannot sign in with a blank token".to_string(),
            });
        }

        // Held across the store swap: a refresh from the previous session
        // must not persist its record on top of the new token.
        let guard = self.persist_lock.lock().await;
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save_sign_in(&token, record.as_ref()).await {
                warn!(error = %e, "failed to persist login");
            }
        }

        info!(user_id = ?record.as_ref().and_then(|r| r.id), "session signed in");
        self.store.sign_in(token, record);
        drop(guard);
        self.recheck_payment_status();
        Ok(())
    }

    /// Ends the session and forgets the persisted copy.
    pub async fn logout(&self) {
        self.store.clear();
        if let Some(persistence) = &self.persistence {
            let _guard = self.persist_lock.lock().await;
            if let Err(e) = persistence.clear().await {
                warn!(error = %e, "failed to clear persisted session");
            }
        }
        info!("session signed out");
        self.recheck_payment_status();
    }

    /// Runs one pass of the refresh pipeline for `trigger`.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let snapshot = self.store.snapshot();
        let decision = self.policy.decide(
            trigger,
            &snapshot.refresh,
            snapshot.record.as_deref(),
            self.clock.now(),
        );

        let reason = match decision {
            RefreshDecision::Skip(reason) => {
                debug!(%trigger, ?reason, "refresh skipped");
                return RefreshOutcome::Skipped(reason);
            }
            RefreshDecision::Refresh(reason) => reason,
        };
        let Some(token) = snapshot.refresh.token else {
            return RefreshOutcome::Skipped(SkipReason::NotAuthenticated);
        };

        debug!(%trigger, ?reason, "refreshing session");
        let result = self.source.fetch_session(&token).await;

        match self.guard.merge(&self.store, &token, result, self.clock.now()) {
            MergeOutcome::Accepted => {
                self.persist_current().await;
                self.recheck_payment_status();
                RefreshOutcome::Updated
            }
            MergeOutcome::Rejected(reason) => RefreshOutcome::Rejected(reason),
        }
    }

    /// Re-evaluates the payment status against the current store contents
    /// and publishes it if it changed.
    pub fn recheck_payment_status(&self) -> PaymentStatus {
        let snapshot = self.store.snapshot();
        let status = evaluate_payment_status(&snapshot.refresh, snapshot.record.as_deref());
        self.payment_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            debug!(
                show_overlay = status.show_overlay,
                message = %status.message,
                "payment status changed"
            );
            *current = status.clone();
            true
        });
        status
    }

    /// Writes whatever the store holds now. Reading under the lock means the
    /// persisted copy always ends up matching the latest accepted record.
    async fn persist_current(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.store.snapshot();
        let (Some(record), Some(updated_at)) =
            (snapshot.record.as_deref(), snapshot.refresh.last_updated_at)
        else {
            return;
        };
        if !snapshot.refresh.is_signed_in() {
            return;
        }
        if let Err(e) = persistence.save_record(record, updated_at).await {
            warn!(error = %e, category = %e.category(), "failed to persist refreshed session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, Utc};
    use satchel_core::{KeyValueStore, SessionPayload, UserCategory};
    use satchel_test_utils::{MemoryKvStore, MockSessionSource};

    use crate::clock::ManualClock;
    use crate::payment::{NO_SESSION_MESSAGE, UPDATE_REQUIRED_MESSAGE};
    use crate::persist::{RECORD_KEY, TOKEN_KEY, UPDATED_AT_KEY};

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn jane() -> SessionRecord {
        SessionRecord {
            id: Some(61),
            full_name: Some("Jane".into()),
            user_category: Some(UserCategory::Parent),
            user_payments: Some(vec![]),
            ..SessionRecord::default()
        }
    }

    struct Fixture {
        sync: SessionSync,
        source: Arc<MockSessionSource>,
        kv: Arc<MemoryKvStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let source = Arc::new(MockSessionSource::new());
        let kv = Arc::new(MemoryKvStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let sync = SessionSync::new(source.clone(), RefreshPolicy::new(Duration::from_secs(300)))
            .with_persistence(SessionPersistence::new(kv.clone()))
            .with_clock(clock.clone());
        Fixture {
            sync,
            source,
            kv,
            clock,
        }
    }

    #[tokio::test]
    async fn signed_out_refresh_never_fetches() {
        let f = fixture();
        let outcome = f.sync.refresh(RefreshTrigger::Manual).await;
        assert_eq!(outcome, RefreshOutcome::Skipped(SkipReason::NotAuthenticated));
        assert_eq!(f.source.call_count(), 0);
        assert_eq!(f.sync.payment_status().message, NO_SESSION_MESSAGE);
    }

    #[tokio::test]
    async fn blank_token_login_is_refused() {
        let f = fixture();
        let err = f.sync.login(AuthToken::new("  "), Some(jane())).await;
        assert!(matches!(err, Err(SatchelError::Unauthorized { .. })));
        assert!(!f.sync.reader().is_signed_in());
    }

    #[tokio::test]
    async fn login_then_mount_fetches_and_persists() {
        let f = fixture();
        f.sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        assert_eq!(f.kv.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok"));
        assert!(f.sync.payment_status().show_overlay);

        let mut refreshed = jane();
        refreshed.user_payments = Some(vec![Default::default()]);
        f.source.push_ok(SessionPayload::Single(refreshed.clone()));

        let outcome = f.sync.refresh(RefreshTrigger::Mount).await;
        assert_eq!(outcome, RefreshOutcome::Updated);
        assert_eq!(f.sync.reader().last_updated_at(), Some(start()));
        assert!(!f.sync.payment_status().show_overlay);

        let stored: SessionRecord =
            serde_json::from_str(&f.kv.get(RECORD_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, refreshed);
        assert!(f.kv.get(UPDATED_AT_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn mount_inside_window_is_skipped() {
        let f = fixture();
        f.sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        f.source.push_ok(SessionPayload::Single(jane()));
        assert_eq!(f.sync.refresh(RefreshTrigger::Mount).await, RefreshOutcome::Updated);

        f.clock.advance(TimeDelta::minutes(2));
        assert_eq!(
            f.sync.refresh(RefreshTrigger::Mount).await,
            RefreshOutcome::Skipped(SkipReason::Fresh)
        );
        assert_eq!(f.source.call_count(), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_keeps_everything() {
        let f = fixture();
        f.sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        let before = f.sync.payment_status();

        f.source.push_ok(SessionPayload::Empty);
        let outcome = f.sync.refresh(RefreshTrigger::Periodic).await;
        assert_eq!(outcome, RefreshOutcome::Rejected(RejectReason::EmptyPayload));
        assert_eq!(*f.sync.reader().record().unwrap(), jane());
        assert!(f.sync.reader().last_updated_at().is_none());
        assert_eq!(f.sync.payment_status(), before);
        assert!(f.kv.get(UPDATED_AT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_store_and_persistence() {
        let f = fixture();
        f.sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        assert_eq!(f.sync.payment_status().message, UPDATE_REQUIRED_MESSAGE);

        f.sync.logout().await;
        assert!(!f.sync.reader().is_signed_in());
        assert!(f.sync.reader().record().is_none());
        assert!(f.kv.is_empty());
        assert_eq!(f.sync.payment_status().message, NO_SESSION_MESSAGE);
    }

    #[tokio::test]
    async fn restore_seeds_store_from_persistence() {
        let f = fixture();
        f.sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        f.source.push_ok(SessionPayload::Single(jane()));
        f.sync.refresh(RefreshTrigger::Manual).await;

        let source = Arc::new(MockSessionSource::new());
        let revived = SessionSync::new(source.clone(), RefreshPolicy::default())
            .with_persistence(SessionPersistence::new(f.kv.clone()))
            .with_clock(f.clock.clone());
        assert!(revived.restore().await);

        let reader = revived.reader();
        assert!(reader.is_signed_in());
        assert_eq!(*reader.record().unwrap(), jane());
        assert_eq!(reader.last_updated_at(), Some(start()));
        assert!(revived.payment_status().show_overlay);

        assert_eq!(
            revived.refresh(RefreshTrigger::Mount).await,
            RefreshOutcome::Skipped(SkipReason::Fresh)
        );
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_block_refresh() {
        let f = fixture();
        f.sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        f.kv.set_failing(true);

        f.source.push_ok(SessionPayload::Single(jane()));
        assert_eq!(f.sync.refresh(RefreshTrigger::Manual).await, RefreshOutcome::Updated);
        assert_eq!(f.sync.reader().last_updated_at(), Some(start()));

        f.sync.logout().await;
        assert!(!f.sync.reader().is_signed_in());
    }

    async fn wait_for_calls(source: &MockSessionSource, n: usize) {
        while source.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_finishing_after_logout_is_dropped() {
        let f = fixture();
        let sync = Arc::new(f.sync);
        sync.login(AuthToken::new("tok"), Some(jane())).await.unwrap();
        f.source
            .push_delayed(SessionPayload::Single(jane()), Duration::from_millis(50));

        let in_flight = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh(RefreshTrigger::Manual).await }
        });
        wait_for_calls(&f.source, 1).await;
        sync.logout().await;

        let outcome = in_flight.await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Rejected(RejectReason::SessionChanged));
        assert!(sync.reader().record().is_none());
        assert!(f.kv.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_from_previous_user_never_persists_over_new_login() {
        let f = fixture();
        let sync = Arc::new(f.sync);
        sync.login(AuthToken::new("old"), Some(jane())).await.unwrap();
        f.kv.set_write_delay(Duration::from_millis(100));
        f.source
            .push_delayed(SessionPayload::Single(jane()), Duration::from_millis(50));

        let in_flight = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh(RefreshTrigger::Manual).await }
        });
        wait_for_calls(&f.source, 1).await;

        let mut bob = jane();
        bob.id = Some(77);
        bob.full_name = Some("Bob".into());
        sync.login(AuthToken::new("new"), Some(bob.clone())).await.unwrap();
        in_flight.await.unwrap();
        f.kv.set_write_delay(Duration::ZERO);

        assert_eq!(f.kv.get(TOKEN_KEY).await.unwrap().as_deref(), Some("new"));
        let stored: SessionRecord =
            serde_json::from_str(&f.kv.get(RECORD_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, bob);
        assert!(f.kv.get(UPDATED_AT_KEY).await.unwrap().is_none());
        assert_eq!(sync.reader().record().unwrap().id, Some(77));
    }

    #[tokio::test(start_paused = true)]
    async fn last_fetch_to_complete_wins() {
        let f = fixture();
        let sync = Arc::new(f.sync);
        sync.login(AuthToken::new("tok"), None).await.unwrap();

        let mut first = jane();
        first.full_name = Some("Jane (slow)".into());
        let mut second = jane();
        second.full_name = Some("Jane (fast)".into());
        f.source
            .push_delayed(SessionPayload::Single(first), Duration::from_secs(2));
        f.source
            .push_delayed(SessionPayload::Single(second), Duration::from_secs(1));

        let slow = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh(RefreshTrigger::Mount).await }
        });
        wait_for_calls(&f.source, 1).await;
        let fast = tokio::spawn({
            let sync = sync.clone();
            async move { sync.refresh(RefreshTrigger::Foreground).await }
        });

        assert_eq!(fast.await.unwrap(), RefreshOutcome::Updated);
        assert_eq!(slow.await.unwrap(), RefreshOutcome::Updated);
        assert_eq!(
            sync.reader().record().unwrap().full_name.as_deref(),
            Some("Jane (slow)")
        );
    }
}
