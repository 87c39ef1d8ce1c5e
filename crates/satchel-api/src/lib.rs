// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend client for the Satchel session core.
//!
//! [`ApiClient`] fetches the current user's session record and implements
//! [`SessionSource`](satchel_core::SessionSource). [`media`] resolves
//! uploaded-media references such as profile images against the backend.

pub mod client;
pub mod media;

pub use client::ApiClient;
pub use media::resolve_media_url;
