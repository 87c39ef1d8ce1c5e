// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validation gate between a fetch result and the session store.
//!
//! The guard is the only path that replaces a record in an active session.
//! A record is accepted only when it passes the completeness check, so the
//! store never moves from a complete record to an incomplete one.

use chrono::{DateTime, Utc};
use satchel_core::{AuthToken, FailureCategory, SatchelError, SessionPayload, SessionRecord};
use tracing::{debug, info, warn};

use crate::store::SessionStore;

/// Why a fetch result was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The fetch itself failed.
    Fetch(FailureCategory),
    /// The backend answered without a record.
    EmptyPayload,
    /// The candidate lacked required fields.
    Incomplete(Vec<&'static str>),
    /// The session was ended or replaced while the fetch was in flight.
    SessionChanged,
}

/// Result of offering a fetch result to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Accepted,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeGuard;

impl MergeGuard {
    pub fn new() -> Self {
        Self
    }

    /// Picks the candidate record out of a fetch result without touching
    /// any state. Collections yield their first element.
    pub fn select_candidate(
        result: Result<SessionPayload, SatchelError>,
    ) -> Result<SessionRecord, RejectReason> {
        let payload = match result {
            Ok(payload) => payload,
            Err(SatchelError::EmptyPayload) => return Err(RejectReason::EmptyPayload),
            Err(SatchelError::IncompleteRecord { missing }) => {
                return Err(RejectReason::Incomplete(missing));
            }
            Err(err) => return Err(RejectReason::Fetch(err.category())),
        };

        let candidate = match payload {
            SessionPayload::Empty => return Err(RejectReason::EmptyPayload),
            SessionPayload::Single(record) => record,
            SessionPayload::Many { first, count } => {
                if count > 1 {
                    debug!(
                        count,
                        "session collection returned, taking first entry as current user"
                    );
                }
                first
            }
        };

        let missing = candidate.missing_fields();
        if missing.is_empty() {
            Ok(candidate)
        } else {
            Err(RejectReason::Incomplete(missing))
        }
    }

    /// Validates `result` and, if acceptable, replaces the stored record and
    /// stamps `last_updated_at = now`. Rejections leave the store untouched.
    pub fn merge(
        &self,
        store: &SessionStore,
        fetched_with: &AuthToken,
        result: Result<SessionPayload, SatchelError>,
        now: DateTime<Utc>,
    ) -> MergeOutcome {
        match &result {
            // Reported below under their own reject reasons.
            Ok(_) | Err(SatchelError::EmptyPayload | SatchelError::IncompleteRecord { .. }) => {}
            Err(err) => log_fetch_failure(err),
        }

        let candidate = match Self::select_candidate(result) {
            Ok(candidate) => candidate,
            Err(reason) => {
                match &reason {
                    RejectReason::Incomplete(missing) => warn!(
                        missing = %missing.join(","),
                        "session refresh rejected: incomplete record, keeping stored session"
                    ),
                    RejectReason::EmptyPayload => {
                        warn!("session refresh rejected: empty payload, keeping stored session")
                    }
                    RejectReason::Fetch(_) | RejectReason::SessionChanged => {}
                }
                return MergeOutcome::Rejected(reason);
            }
        };

        let user_id = candidate.id;
        if store.replace_record(fetched_with, candidate, now) {
            info!(user_id = ?user_id, "session record refreshed");
            MergeOutcome::Accepted
        } else {
            debug!("session changed while fetch was in flight, discarding result");
            MergeOutcome::Rejected(RejectReason::SessionChanged)
        }
    }
}

fn log_fetch_failure(err: &SatchelError) {
    match err.category() {
        FailureCategory::Authentication => warn!(
            category = %err.category(),
            error = %err,
            "session refresh rejected by backend authentication, keeping stored session"
        ),
        FailureCategory::Validation | FailureCategory::Transport => warn!(
            category = %err.category(),
            error = %err,
            "session refresh failed, keeping stored session"
        ),
        FailureCategory::Storage | FailureCategory::Internal => tracing::error!(
            category = %err.category(),
            error = %err,
            "session refresh failed unexpectedly"
        ),
    }
}
