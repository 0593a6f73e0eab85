//! Server configuration.

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use shop_commerce::CatalogSettings;

use crate::logging::LogFormat;

/// Server configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// SQLite database URL, e.g. `sqlite://shop.db` or `sqlite::memory:`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Default log filter; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Listing and trending settings.
    #[serde(default)]
    pub catalog: CatalogSettings,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_database_url() -> String {
    "sqlite://shop.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database_url: default_database_url(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            request_timeout_secs: default_request_timeout_secs(),
            catalog: CatalogSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML or JSON file, chosen by extension.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.database_url.starts_with("sqlite:"),
            "database_url must be a sqlite: URL"
        );
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        let catalog = &self.catalog;
        ensure!(catalog.max_page_size >= 1, "catalog.max_page_size must be at least 1");
        ensure!(
            (1..=catalog.max_page_size).contains(&catalog.default_page_size),
            "catalog.default_page_size must be between 1 and max_page_size"
        );
        ensure!(catalog.trending_window_days > 0, "catalog.trending_window_days must be positive");
        ensure!(catalog.low_stock_threshold >= 0, "catalog.low_stock_threshold cannot be negative");
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
