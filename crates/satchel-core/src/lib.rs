// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Satchel session core.
//!
//! This crate provides the shared record types, the error type, and the
//! adapter traits through which the session pipeline reaches the backend
//! and the persistent key-value store.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FailureCategory, SatchelError};
pub use types::{
    AdapterType, AuthToken, HealthStatus, PaymentRecord, PaymentStatus, RefreshTrigger,
    SchoolContact, SessionPayload, SessionRecord, UserCategory,
};

pub use traits::{Adapter, KeyValueStore, SessionSource};
