//! Patchlab configuration management
//! Handles loading and saving the editor's service-layer settings

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::canvas::OverlaySettings;

/// Patchlab configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Export toolchain settings
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Overlay toggles per editor mode
    #[serde(default)]
    pub overlays: OverlaySettings,
}

/// Export toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Binary name or path of the patch compiler
    #[serde(default = "default_toolchain")]
    pub toolchain: String,

    /// Arguments placed before the per-job ones
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Sleep between output polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_toolchain() -> String {
    "hvcc".to_string()
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            toolchain: default_toolchain(),
            extra_args: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Load config from the default location or specified path
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = Self::config_path(path)?;

        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&raw).context("Failed to parse config file")?;

        debug!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save config to the default location or specified path
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = Self::config_path(path)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(&self)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the config file path
    fn config_path(path: Option<&str>) -> Result<PathBuf> {
        // Check env override first
        if let Ok(env_path) = std::env::var("PATCHLAB_CONFIG") {
            return Ok(PathBuf::from(env_path));
        }

        if let Some(p) = path {
            return Ok(PathBuf::from(p));
        }

        let home = dirs::home_dir().context("Cannot find home directory")?;
        Ok(home.join(".patchlab").join("config.yml"))
    }
}
