//! Configuration file support for nestsync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `NESTSYNC_`, e.g., `NESTSYNC_DATABASE_URL`)
//! 3. Config file (~/.config/nestsync/config.toml or ./nestsync.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/nestsync/nestsync.db"  # optional, this is the default
//!
//! [provider]
//! api_key = "..."       # or use NESTSYNC_PROVIDER_API_KEY env var
//! base_url = "https://homescope.example.com"
//! requests_per_second = 2
//!
//! [sync]
//! interval_secs = 3600
//! batch_size = 10
//! workers = 4
//! detail_max_age_hours = 24
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use nestsync::sync::SyncOptions;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Listing provider configuration.
    pub provider: ProviderConfig,
    /// Scheduler defaults.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/nestsync/nestsync.db` if not specified.
    pub url: Option<String>,
}

/// Listing provider configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Gateway API key.
    /// Can also be set via NESTSYNC_PROVIDER_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Gateway base URL.
    pub base_url: String,
    /// Proactive request ceiling shared by all sync workers.
    pub requests_per_second: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://homescope.example.com".to_string(),
            requests_per_second: nestsync::provider::DEFAULT_PROVIDER_RPS,
        }
    }
}

/// Scheduler defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between scheduler ticks.
    pub interval_secs: u64,
    /// Collections picked up per tick.
    pub batch_size: u64,
    /// Concurrent collection syncs per tick.
    pub workers: usize,
    /// Cached property detail older than this many hours is swept.
    pub detail_max_age_hours: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let defaults = SyncOptions::default();
        Self {
            interval_secs: defaults.interval.as_secs(),
            batch_size: defaults.batch_size,
            workers: defaults.workers,
            detail_max_age_hours: defaults.detail_max_age.as_secs() / 3600,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "nestsync") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Local config file overrides the XDG one.
        let local_config = PathBuf::from("nestsync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./nestsync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // NESTSYNC_DATABASE_URL -> database.url, and so on.
        builder = builder.add_source(
            Environment::with_prefix("NESTSYNC")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the
    /// file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("nestsync.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Scheduler options assembled from the config, with CLI overrides.
    pub fn sync_options(
        &self,
        batch_size: Option<u64>,
        workers: Option<usize>,
        interval_secs: Option<u64>,
    ) -> SyncOptions {
        SyncOptions {
            interval: Duration::from_secs(interval_secs.unwrap_or(self.sync.interval_secs)),
            batch_size: batch_size.unwrap_or(self.sync.batch_size),
            workers: workers.unwrap_or(self.sync.workers),
            provider_rps: self.provider.requests_per_second,
            detail_max_age: Duration::from_secs(self.sync.detail_max_age_hours * 3600),
        }
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/nestsync` or `~/.local/state/nestsync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "nestsync").map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
