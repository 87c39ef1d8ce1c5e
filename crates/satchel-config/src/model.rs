// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Satchel session core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Satchel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SatchelConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Refresh cadence and freshness settings.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Session persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the school-management backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the current-user session endpoint, relative to `base_url`.
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// Scheme placed before the token in the `Authorization` header.
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient backend errors (429, 5xx).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_path: default_session_path(),
            auth_scheme: default_auth_scheme(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_session_path() -> String {
    "/api/users/current/".to_string()
}

fn default_auth_scheme() -> String {
    "Token".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

/// Refresh cadence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshConfig {
    /// A complete record younger than this is not refetched on mount.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Interval of the periodic refresh timer.
    #[serde(default = "default_periodic_interval_secs")]
    pub periodic_interval_secs: u64,

    /// Interval of the payment-status re-check timer.
    #[serde(default = "default_payment_check_interval_secs")]
    pub payment_check_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: default_freshness_window_secs(),
            periodic_interval_secs: default_periodic_interval_secs(),
            payment_check_interval_secs: default_payment_check_interval_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    pub fn periodic_interval(&self) -> Duration {
        Duration::from_secs(self.periodic_interval_secs)
    }

    pub fn payment_check_interval(&self) -> Duration {
        Duration::from_secs(self.payment_check_interval_secs)
    }
}

fn default_freshness_window_secs() -> u64 {
    5 * 60
}

fn default_periodic_interval_secs() -> u64 {
    10 * 60
}

fn default_payment_check_interval_secs() -> u64 {
    10 * 60
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite key-value database.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("satchel").join("satchel.db"))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "satchel.db".to_string())
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_cadence() {
        let config = SatchelConfig::default();
        assert_eq!(config.refresh.freshness_window(), Duration::from_secs(300));
        assert_eq!(config.refresh.periodic_interval(), Duration::from_secs(600));
        assert_eq!(config.refresh.payment_check_interval(), Duration::from_secs(600));
        assert_eq!(config.api.auth_scheme, "Token");
        assert!(config.storage.database_path.ends_with("satchel.db"));
    }
}
