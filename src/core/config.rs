use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl SourceConfig {
    fn new(base_url: &str, timeout_secs: u64) -> Self {
        SourceConfig {
            base_url: base_url.to_string(),
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub primary: SourceConfig,
    pub fallback: SourceConfig,
    pub crypto: SourceConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            primary: SourceConfig::new("https://api.exchangerate-api.com/v4/latest", 10),
            fallback: SourceConfig::new("https://api.fixer.io/latest", 10),
            crypto: SourceConfig::new("https://api.coinbase.com/v2/exchange-rates", 5),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub base_currency: String,
    pub cache_ttl_minutes: u64,
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: "USD".to_string(),
            cache_ttl_minutes: 30,
            providers: ProvidersConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "denominations", "denominations")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "denominations", "denominations")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
