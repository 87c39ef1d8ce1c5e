// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of uploaded-media references (profile images, attachments).
//!
//! The backend returns media references in three shapes: absolute URLs,
//! server-absolute paths (`/media/avatars/61.jpg`), and bare file names
//! (`61.jpg`). All are resolved to an absolute URL on the backend origin.

use reqwest::Url;

/// Path prefix under which bare file names are served.
const MEDIA_PREFIX: &str = "/media/";

/// Resolves `reference` against `base_url`.
///
/// Returns `None` for blank references or when the result is not a valid URL.
pub fn resolve_media_url(base_url: &str, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Url::parse(reference).ok();
    }

    let base = Url::parse(base_url).ok()?;
    if reference.starts_with('/') {
        return base.join(reference).ok();
    }

    let file_name = reference.trim_start_matches("./");
    base.join(&format!("{MEDIA_PREFIX}{file_name}")).ok()
}
