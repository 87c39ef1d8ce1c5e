// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether a trigger should turn into a refresh fetch.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use satchel_config::model::RefreshConfig;
use satchel_core::{RefreshTrigger, SessionRecord};

use crate::store::RefreshState;

/// Why a refresh was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// Nothing is stored yet.
    NoRecord,
    /// The stored record fails the completeness check.
    IncompleteRecord,
    /// The trigger always refreshes (periodic, foreground, manual).
    Trigger(RefreshTrigger),
    /// The stored record is older than the freshness window.
    Stale,
}

/// Why a refresh was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAuthenticated,
    /// A complete record was updated within the freshness window.
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    Refresh(RefreshReason),
    Skip(SkipReason),
}

impl RefreshDecision {
    pub fn should_refresh(&self) -> bool {
        matches!(self, RefreshDecision::Refresh(_))
    }
}

/// Pure refresh gate.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    freshness_window: TimeDelta,
}

impl RefreshPolicy {
    pub fn new(freshness_window: Duration) -> Self {
        Self {
            freshness_window: TimeDelta::from_std(freshness_window).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn from_config(config: &RefreshConfig) -> Self {
        Self::new(config.freshness_window())
    }

    /// Applies the refresh rules in order:
    /// 1. not signed in: skip
    /// 2. no record: refresh
    /// 3. incomplete record: refresh
    /// 4. `Mount` with a record updated inside the window: skip;
    ///    every other trigger refreshes regardless of age
    /// 5. otherwise refresh
    pub fn decide(
        &self,
        trigger: RefreshTrigger,
        state: &RefreshState,
        record: Option<&SessionRecord>,
        now: DateTime<Utc>,
    ) -> RefreshDecision {
        if !state.is_signed_in() {
            return RefreshDecision::Skip(SkipReason::NotAuthenticated);
        }

        let Some(record) = record else {
            return RefreshDecision::Refresh(RefreshReason::NoRecord);
        };

        if !record.is_complete() {
            return RefreshDecision::Refresh(RefreshReason::IncompleteRecord);
        }

        match trigger {
            RefreshTrigger::Mount => match state.last_updated_at {
                // A timestamp in the future (clock skew) also counts as fresh.
                Some(updated) if now.signed_duration_since(updated) < self.freshness_window => {
                    RefreshDecision::Skip(SkipReason::Fresh)
                }
                _ => RefreshDecision::Refresh(RefreshReason::Stale),
            },
            RefreshTrigger::Periodic | RefreshTrigger::Foreground | RefreshTrigger::Manual => {
                RefreshDecision::Refresh(RefreshReason::Trigger(trigger))
            }
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from_config(&RefreshConfig::default())
    }
}
