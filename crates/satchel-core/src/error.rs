// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Satchel session core.

use std::time::Duration;

use strum::Display;
use thiserror::Error;

/// The primary error type used across adapter traits and the refresh pipeline.
#[derive(Debug, Error)]
pub enum SatchelError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Key-value storage errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Network-level failure reaching the backend (connect, reset, timeout).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend rejected the credential (401/403).
    #[error("authentication rejected: {message}")]
    Unauthorized { message: String },

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A fetched record lacks fields required to replace stored state.
    #[error("incomplete session record, missing: {}", missing.join(", "))]
    IncompleteRecord { missing: Vec<&'static str> },

    /// The backend answered successfully but carried no record.
    #[error("session payload was empty")]
    EmptyPayload,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse failure buckets used as a structured log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureCategory {
    Transport,
    Authentication,
    Validation,
    Storage,
    Internal,
}

impl SatchelError {
    /// Classifies this error for logging.
    pub fn category(&self) -> FailureCategory {
        match self {
            SatchelError::Transport { .. }
            | SatchelError::Server { .. }
            | SatchelError::Timeout { .. } => FailureCategory::Transport,
            SatchelError::Unauthorized { .. } => FailureCategory::Authentication,
            SatchelError::Decode { .. }
            | SatchelError::IncompleteRecord { .. }
            | SatchelError::EmptyPayload => FailureCategory::Validation,
            SatchelError::Storage { .. } => FailureCategory::Storage,
            SatchelError::Config(_) | SatchelError::Internal(_) => FailureCategory::Internal,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        SatchelError::Storage {
            source: Box::new(source),
        }
    }
}
