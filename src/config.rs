//! Application configuration.
//!
//! Handles loading, validating, and merging `rango.toml`. Stock defaults are
//! the base layer; the user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "127.0.0.1:8000"   # Address the HTTP server listens on
//!
//! [database]
//! path = "rango.sqlite3"    # SQLite database file
//!
//! [session]
//! cookie_name = "sessionid" # Name of the session cookie
//! secure = false            # Only send the cookie over HTTPS
//! expiry_days = 14          # Sessions expire after this many idle days
//!
//! [listing]
//! top_categories = 5        # Categories shown on the index page
//! top_pages = 5             # Pages shown on the index page
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `rango.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// SQLite storage settings.
    pub database: DatabaseConfig,
    /// Session cookie settings.
    pub session: SessionConfig,
    /// How many records the index page lists.
    pub listing: ListingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind must be a socket address like 127.0.0.1:8000, got {:?}",
                self.server.bind
            )));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.path must not be empty".into(),
            ));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "session.cookie_name must not be empty".into(),
            ));
        }
        if self.session.expiry_days == 0 {
            return Err(ConfigError::Validation(
                "session.expiry_days must be at least 1".into(),
            ));
        }
        if self.listing.top_categories == 0 || self.listing.top_pages == 0 {
            return Err(ConfigError::Validation(
                "listing sizes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8000`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path of the SQLite file. Created on first use.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "rango.sqlite3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Mark the cookie `Secure`. Leave off for plain-HTTP development.
    pub secure: bool,
    /// Idle lifetime of a session, in days.
    pub expiry_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sessionid".to_string(),
            secure: false,
            expiry_days: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Categories on the index page, most liked first.
    pub top_categories: u32,
    /// Pages on the index page, most viewed first.
    pub top_pages: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            top_categories: 5,
            top_pages: 5,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// the file is absent.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(path)?)
}

/// Returns a fully-commented stock `rango.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Rango Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# Address the server listens on. Use 0.0.0.0:8000 to accept remote clients.
bind = "127.0.0.1:8000"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[database]
# SQLite database file. Created (with tables) on first use.
path = "rango.sqlite3"

# ---------------------------------------------------------------------------
# Sessions
# ---------------------------------------------------------------------------
[session]
# Name of the cookie carrying the session id.
cookie_name = "sessionid"

# Only send the session cookie over HTTPS.
secure = false

# Sessions idle for this many days are discarded.
expiry_days = 14

# ---------------------------------------------------------------------------
# Index page
# ---------------------------------------------------------------------------
[listing]
# Most liked categories shown on the index page.
top_categories = 5

# Most viewed pages shown on the index page.
top_pages = 5
"##
}
