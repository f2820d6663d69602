// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./autopier.toml` > `~/.config/autopier/autopier.toml`
//! > `/etc/autopier/autopier.toml` with environment variable overrides via
//! the `AUTOPIER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AutopierConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/autopier/autopier.toml` (system-wide)
/// 3. `~/.config/autopier/autopier.toml` (user XDG config)
/// 4. `./autopier.toml` (local directory)
/// 5. `AUTOPIER_*` environment variables
pub fn load_config() -> Result<AutopierConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AutopierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutopierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AutopierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutopierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AutopierConfig::default()))
        .merge(Toml::file("/etc/autopier/autopier.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("autopier/autopier.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("autopier.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `AUTOPIER_SERVICE_LOG_LEVEL` must map
/// to `service.log_level`, not `service.log.level`.
fn env_provider() -> Env {
    Env::prefixed("AUTOPIER_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: AUTOPIER_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("chat_", "chat.", 1);
        mapped.into()
    })
}
