// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Satchel workspace.

use std::collections::BTreeMap;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    SessionSource,
    KeyValueStore,
}

/// The kind of account a session belongs to.
///
/// Serialized as the backend's integer discriminator. Unknown discriminators
/// are kept as [`UserCategory::Other`] so they survive a persist/restore cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum UserCategory {
    Parent,
    Educator,
    Administrator,
    Student,
    Other(i64),
}

impl From<i64> for UserCategory {
    fn from(value: i64) -> Self {
        match value {
            1 => UserCategory::Parent,
            2 => UserCategory::Educator,
            3 => UserCategory::Administrator,
            4 => UserCategory::Student,
            other => UserCategory::Other(other),
        }
    }
}

impl From<UserCategory> for i64 {
    fn from(category: UserCategory) -> Self {
        match category {
            UserCategory::Parent => 1,
            UserCategory::Educator => 2,
            UserCategory::Administrator => 3,
            UserCategory::Student => 4,
            UserCategory::Other(other) => other,
        }
    }
}

impl std::fmt::Display for UserCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserCategory::Parent => write!(f, "parent"),
            UserCategory::Educator => write!(f, "educator"),
            UserCategory::Administrator => write!(f, "administrator"),
            UserCategory::Student => write!(f, "student"),
            UserCategory::Other(n) => write!(f, "category-{n}"),
        }
    }
}

/// One subscription payment attached to a user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ups_is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Backend fields not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Contact details of the user's school, shown alongside the payment overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchoolContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The signed-in user's profile and payment data as returned by the backend.
///
/// Every field is optional because the backend may answer with a partial
/// payload. Only a record passing [`SessionRecord::is_complete`] may replace
/// stored state during a refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_category: Option<UserCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_payments: Option<Vec<PaymentRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<SchoolContact>,
    /// Backend fields not modelled above, preserved across whole-record replaces.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SessionRecord {
    /// Names of the identity fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.id.is_none() {
            missing.push("id");
        }
        if self
            .full_name
            .as_deref()
            .is_none_or(|name| name.trim().is_empty())
        {
            missing.push("full_name");
        }
        if self.user_category.is_none() {
            missing.push("user_category");
        }
        missing
    }

    /// A record is complete iff `id`, `full_name`, and `user_category` are populated.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Returns true when at least one payment record is attached.
    pub fn has_payments(&self) -> bool {
        self.user_payments
            .as_ref()
            .is_some_and(|payments| !payments.is_empty())
    }
}

/// The decoded `data` member of a session endpoint response.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPayload {
    /// `data` was null or missing.
    Empty,
    /// `data` was a single record.
    Single(SessionRecord),
    /// `data` was a non-empty collection. Only the entry at position 0, the
    /// current user, is decoded; `count` is the collection length.
    Many { first: SessionRecord, count: usize },
}

impl SessionPayload {
    /// Decodes a payload from the raw JSON `data` value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(SessionPayload::Empty),
            Value::Array(items) => {
                let count = items.len();
                match items.into_iter().next() {
                    Some(first) => Ok(SessionPayload::Many {
                        first: serde_json::from_value(first)?,
                        count,
                    }),
                    None => Ok(SessionPayload::Empty),
                }
            }
            other => Ok(SessionPayload::Single(serde_json::from_value(other)?)),
        }
    }

    /// Builds the payload a collection response of `records` decodes to.
    pub fn collection(records: Vec<SessionRecord>) -> Self {
        let count = records.len();
        match records.into_iter().next() {
            Some(first) => SessionPayload::Many { first, count },
            None => SessionPayload::Empty,
        }
    }
}

/// What prompted a refresh attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    /// A screen that depends on session data was shown.
    Mount,
    /// The app moved to the foreground.
    Foreground,
    /// The periodic refresh timer fired.
    Periodic,
    /// The user asked for a refresh.
    Manual,
}

/// Opaque bearer credential for the backend.
///
/// Cheap to clone; the secret is never rendered by `Debug`.
#[derive(Clone)]
pub struct AuthToken(Arc<SecretString>);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(token.into())))
    }

    /// Returns the raw credential for placing in a request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Returns true when the credential is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Whether the payment/subscription overlay should block the UI, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub is_valid: bool,
    pub is_subscription_active: bool,
    pub show_overlay: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_contact: Option<SchoolContact>,
}
