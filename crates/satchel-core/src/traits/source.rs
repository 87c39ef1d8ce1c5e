// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session source trait for the backend's session-fetch endpoint.

use async_trait::async_trait;

use crate::error::SatchelError;
use crate::traits::adapter::Adapter;
use crate::types::{AuthToken, SessionPayload};

/// Fetches the current user's session record from the backend.
///
/// Implementations only translate transport outcomes into
/// [`SessionPayload`] or [`SatchelError`]; validating the payload is
/// the caller's job.
#[async_trait]
pub trait SessionSource: Adapter {
    /// Fetches the session payload for the holder of `token`.
    async fn fetch_session(&self, token: &AuthToken) -> Result<SessionPayload, SatchelError>;
}
