use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Address of the answer-generation backend when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Environment variable that overrides the configured backend address.
pub const BACKEND_URL_ENV: &str = "ACADEMIA_BACKEND_URL";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the answer service (the `/rag` endpoint lives here)
    pub backend_url: String,

    /// Per-request timeout for dispatches
    pub request_timeout_secs: u64,

    /// Where diagnostics go; the TUI owns the terminal
    pub log_file: PathBuf,

    /// Academia home directory
    pub academia_home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let academia_home = home.join(".academia");

        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: 60,
            log_file: academia_home.join("academia.log"),
            academia_home,
        }
    }
}

impl Config {
    /// Load configuration from file, then apply the environment override.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let academia_home = home.join(".academia");
        let config_path = academia_home.join("config.toml");

        fs::create_dir_all(&academia_home).context("Failed to create .academia directory")?;

        let mut config: Config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.academia_home = academia_home;

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend_url = url;
            }
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.academia_home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }
}
