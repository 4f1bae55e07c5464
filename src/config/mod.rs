//! Process configuration.
//!
//! Aggregates the settings of every background component into a single
//! Config struct that can be loaded from YAML files or environment variables.
//! App-level settings edited by admins live in the store instead
//! (see [`crate::models::settings`]).

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "TOPUP_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "TOPUP";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON or YAML database export loaded into the in-memory store at startup.
    pub seed_path: Option<String>,
    /// Retries a transaction gets after a concurrent write before giving up.
    pub transaction_retries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_path: None,
            transaction_retries: crate::storage::memory::DEFAULT_TRANSACTION_RETRIES,
        }
    }
}

/// Order expiry watcher configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// How often due orders are checked, in seconds.
    pub poll_interval_secs: u64,
    /// Most recent orders the watcher keeps track of.
    pub scan_limit: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            scan_limit: 1000,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

/// Dashboard projector configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Records fetched per collection.
    pub fetch_limit: usize,
    /// Unlocked gamer level at which a user counts as an active gamer.
    pub gamer_level_threshold: u32,
    /// Offset from UTC of the back office's calendar day, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 1000,
            gamer_level_threshold: 10,
            utc_offset_minutes: 0,
        }
    }
}

/// Admin list pagination configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Initial fetch limit, also the increment of each "load more".
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub watcher: WatcherConfig,
    pub dashboard: DashboardConfig,
    pub pagination: PaginationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or disable a component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watcher.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "watcher.poll_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.watcher.scan_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "watcher.scan_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.dashboard.fetch_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "dashboard.fetch_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.dashboard.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid {
                field: "dashboard.utc_offset_minutes",
                reason: format!("{} is not a valid UTC offset", self.dashboard.utc_offset_minutes),
            });
        }
        if self.pagination.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "pagination.page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
