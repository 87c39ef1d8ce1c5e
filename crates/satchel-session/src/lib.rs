// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session state and refresh pipeline for Satchel.
//!
//! Triggers flow through [`RefreshPolicy`], which decides whether to fetch;
//! fetch results pass through [`MergeGuard`] before they may replace the
//! stored record; every change re-evaluates the payment overlay.
//! [`SessionSync`] wires these together and [`RefreshScheduler`] drives it
//! on timers and foreground transitions.

pub mod clock;
pub mod guard;
pub mod payment;
pub mod persist;
pub mod policy;
pub mod scheduler;
pub mod store;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use guard::{MergeGuard, MergeOutcome, RejectReason};
pub use payment::evaluate_payment_status;
pub use persist::{PersistedSession, SessionPersistence};
pub use policy::{RefreshDecision, RefreshPolicy, RefreshReason, SkipReason};
pub use scheduler::{AppLifecycle, RefreshScheduler, ScheduleConfig, SchedulerState};
pub use store::{RefreshState, SessionReader, SessionSnapshot, SessionStore};
pub use sync::{RefreshOutcome, SessionSync};
