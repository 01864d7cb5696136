//! Configuration file support for NutriJoy.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/nutrijoy/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote API settings used to resolve meal image references
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            placeholder_image: default_placeholder_image(),
        }
    }
}

/// Presentation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Upper end of the BMI gauge
    #[serde(default = "default_bmi_scale")]
    pub bmi_scale: f64,

    /// Window used by `history` when no --days is given
    #[serde(default = "default_history_days")]
    pub history_days: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bmi_scale: default_bmi_scale(),
            history_days: default_history_days(),
        }
    }
}

// Default value functions
fn home_dir_or_cwd() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base =
        dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join("nutrijoy")
}

fn default_base_url() -> String {
    "https://nutrijoy-backend.onrender.com".into()
}

fn default_placeholder_image() -> String {
    "/placeholder.png".into()
}

fn default_bmi_scale() -> f64 {
    crate::metabolic::DEFAULT_BMI_SCALE
}

fn default_history_days() -> i64 {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would make the derived figures meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.display.bmi_scale.is_finite() && self.display.bmi_scale > 0.0) {
            return Err(Error::Config(format!(
                "display.bmi_scale must be positive, got {}",
                self.display.bmi_scale
            )));
        }
        if self.display.history_days < 0 {
            return Err(Error::Config(format!(
                "display.history_days must not be negative, got {}",
                self.display.history_days
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join("nutrijoy").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
