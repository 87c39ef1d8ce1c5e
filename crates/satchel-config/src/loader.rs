// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./satchel.toml` > `~/.config/satchel/satchel.toml` >
//! `/etc/satchel/satchel.toml`, with `SATCHEL_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SatchelConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/satchel/satchel.toml";

/// Local config file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "satchel.toml";

/// Path of the per-user config file, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("satchel").join("satchel.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/satchel/satchel.toml`
/// 3. `~/.config/satchel/satchel.toml`
/// 4. `./satchel.toml`
/// 5. `SATCHEL_*` environment variables
pub fn load_config() -> Result<SatchelConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SatchelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SatchelConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SatchelConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SatchelConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SatchelConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Config sections reachable from the environment.
const ENV_SECTIONS: [&str; 4] = ["api", "refresh", "storage", "logging"];

/// Environment provider mapping `SATCHEL_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `base_url` contain underscores themselves. Variables outside the config
/// sections, such as `SATCHEL_TOKEN`, are left alone.
fn env_provider() -> Env {
    Env::prefixed("SATCHEL_")
        .filter(|key| section_of(key.as_str()).is_some())
        .map(|key| {
            let lower = key.as_str().to_ascii_lowercase();
            let mapped = match section_of(&lower) {
                Some(section) => lower.replacen(&format!("{section}_"), &format!("{section}."), 1),
                None => lower,
            };
            mapped.into()
        })
}

fn section_of(key: &str) -> Option<&'static str> {
    let lower = key.to_ascii_lowercase();
    ENV_SECTIONS
        .into_iter()
        .find(|section| lower.starts_with(&format!("{section}_")))
}
