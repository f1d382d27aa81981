//! Configuration management for AutoDVIC.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/autodvic/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General application settings
    pub general: GeneralConfig,
    /// Portal connection settings
    pub portal: PortalConfig,
    /// Operator identity printed on reports
    pub identity: IdentityConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// When true, the final submit click is replaced by a notice so the
    /// flow can be rehearsed without mutating portal data.
    pub dev_mode: bool,
    /// Path to a selector registry TOML overriding the built-in defaults.
    pub selectors_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            selectors_file: None,
        }
    }
}

/// Portal connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Base URL of the fleet-management portal
    pub base_url: String,
    /// DevTools websocket URL of an already-running browser to attach to;
    /// when unset a browser is launched instead.
    pub websocket_url: Option<String>,
    /// Launch the browser headless (attach mode ignores this)
    pub headless: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://logistics.amazon.com/fleet-management".to_string(),
            websocket_url: None,
            headless: false,
        }
    }
}

/// Operator identity fields printed on the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// DSP code
    pub dsp_code: String,
    /// Station code
    pub station_code: String,
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

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `AUTODVIC_DEV_MODE`: Override dev mode (true/false)
    /// - `AUTODVIC_HEADLESS`: Override browser headless mode (true/false)
    /// - `AUTODVIC_WS_URL`: Override the DevTools websocket URL
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("AUTODVIC_DEV_MODE") {
            if let Ok(dev_mode) = val.parse() {
                config.general.dev_mode = dev_mode;
                tracing::debug!("Override general.dev_mode from env: {}", dev_mode);
            }
        }

        if let Ok(val) = std::env::var("AUTODVIC_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.portal.headless = headless;
                tracing::debug!("Override portal.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("AUTODVIC_WS_URL") {
            config.portal.websocket_url = Some(val);
        }

        Ok(config)
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

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns error if the portal base URL is empty.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.portal.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "portal.base_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/autodvic/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "autodvic", "autodvic").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/autodvic`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "autodvic", "autodvic").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}
