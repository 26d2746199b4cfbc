//! Configuration management for Pagewatch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/pagewatch/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General runtime settings
    pub general: GeneralConfig,
    /// Remote audit engine settings
    pub audit: AuditConfig,
    /// Scan and crawl behavior settings
    pub scanning: ScanningConfig,
    /// Persistence settings
    pub database: DatabaseConfig,
    /// Event bus settings
    pub events: EventsConfig,
    /// Admission control budgets
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PAGEWATCH_ENV`: `production` or `development`
    /// - `PAGEWATCH_SUPER_MODE`: lift all tier restrictions (true/false)
    /// - `PAGEWATCH_AUDIT_URL`: remote audit engine endpoint
    /// - `PAGEWATCH_DATABASE_URL`: database path
    /// - `PAGEWATCH_DISABLE_STORE_SCRIPTS`: force `noStore` on every audit (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Unparseable values are ignored and the file/default value is kept.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PAGEWATCH_ENV") {
            match val.to_lowercase().as_str() {
                "production" => self.general.environment = Environment::Production,
                "development" | "dev" => self.general.environment = Environment::Development,
                other => tracing::warn!("Ignoring unknown PAGEWATCH_ENV value: {}", other),
            }
        }

        if let Some(val) = lookup("PAGEWATCH_SUPER_MODE") {
            if let Ok(enabled) = val.parse() {
                self.general.super_mode = enabled;
                tracing::debug!("Override general.super_mode from env: {}", enabled);
            }
        }

        if let Some(val) = lookup("PAGEWATCH_AUDIT_URL") {
            tracing::debug!("Override audit.endpoint from env: {}", val);
            self.audit.endpoint = val;
        }

        if let Some(val) = lookup("PAGEWATCH_DATABASE_URL") {
            tracing::debug!("Override database.path from env");
            self.database.path = val;
        }

        if let Some(val) = lookup("PAGEWATCH_DISABLE_STORE_SCRIPTS") {
            if let Ok(disabled) = val.parse() {
                self.scanning.disable_store_scripts = disabled;
                tracing::debug!("Override scanning.disable_store_scripts from env: {}", disabled);
            }
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.audit.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit.timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.scanning.crawl_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanning.crawl_concurrency".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "events.channel_capacity".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/pagewatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "pagewatch", "pagewatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/pagewatch`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "pagewatch", "pagewatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Execution environment. Local targets are only scannable in development.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Public deployment
    #[default]
    Production,
    /// Local or dev execution
    Development,
}

/// General runtime settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Execution environment
    pub environment: Environment,
    /// Treat every caller as privileged (no issue limiting, no tier gating)
    pub super_mode: bool,
}

/// Remote audit engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Base URL of the audit engine
    pub endpoint: String,
    /// Render ceiling in milliseconds
    pub timeout_ms: u64,
}

impl AuditConfig {
    /// Render ceiling as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:50052".to_string(),
            timeout_ms: 15_000,
        }
    }
}

/// Scan and crawl behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Number of issues returned to unprivileged callers
    pub issue_preview_cap: usize,
    /// Concurrent page audits shared by all crawl jobs
    pub crawl_concurrency: usize,
    /// Pending crawl jobs accepted before `submit` waits
    pub crawl_queue_capacity: usize,
    /// Ask the engine to never store scripts, whatever the caller tier
    pub disable_store_scripts: bool,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            issue_preview_cap: 2,
            crawl_concurrency: 3,
            crawl_queue_capacity: 64,
            disable_store_scripts: false,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` file path, or `:memory:`
    pub path: String,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "pagewatch.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Event bus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer per bus; slow subscribers skip past overflow
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Admission control budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// General API requests per window
    pub api_max: u32,
    /// General API window in seconds
    pub api_window_secs: u64,
    /// Scan-class requests per window
    pub scan_max: u32,
    /// Scan-class window in seconds
    pub scan_window_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            api_max: 30,
            api_window_secs: 60,
            scan_max: 4,
            scan_window_secs: 30,
        }
    }
}
