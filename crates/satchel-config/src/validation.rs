// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::SatchelConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &SatchelConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "api.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if !config.api.session_path.starts_with('/') {
        fail(format!(
            "api.session_path `{}` must start with `/`",
            config.api.session_path
        ));
    }

    if config.api.auth_scheme.trim().is_empty() {
        fail("api.auth_scheme must not be empty".to_string());
    }

    if config.api.timeout_secs == 0 {
        fail("api.timeout_secs must be greater than zero".to_string());
    }

    for (key, value) in [
        ("refresh.freshness_window_secs", config.refresh.freshness_window_secs),
        ("refresh.periodic_interval_secs", config.refresh.periodic_interval_secs),
        (
            "refresh.payment_check_interval_secs",
            config.refresh.payment_check_interval_secs,
        ),
    ] {
        if value == 0 {
            fail(format!("{key} must be greater than zero"));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
