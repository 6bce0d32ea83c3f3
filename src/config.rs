//! Plugin configuration loaded once at startup from `config.json`
//!
//! Missing or malformed configuration degrades to safe defaults (empty
//! registries, no API key) instead of aborting startup; every trigger then
//! fails with a missing-key message until the file is fixed and the plugin
//! restarted. There is no hot reload.

use crate::registry::ActionRegistry;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Fallback request timeout when `DEFAULT_TIMEOUT_SECONDS` is unset or invalid
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "HOMEFLOW_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    #[serde(rename = "IFTTT_API_KEY")]
    api_key: String,

    /// Kept as a raw value so a wrong type degrades to the default
    /// instead of failing the whole document
    #[serde(rename = "DEFAULT_TIMEOUT_SECONDS")]
    default_timeout_seconds: Value,

    #[serde(rename = "SCENES")]
    pub scenes: ActionRegistry,

    #[serde(rename = "MOBILITY_ACTIONS")]
    pub mobility_actions: ActionRegistry,
}

impl PluginConfig {
    /// Parse a config document from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load configuration from disk, degrading to defaults on any failure
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Config file not readable at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json_str(&text) {
            Ok(config) => {
                info!("Config loaded successfully from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to parse {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// The configured IFTTT Webhooks key, trimmed; empty means unconfigured
    pub fn api_key(&self) -> &str {
        self.api_key.trim()
    }

    /// Outbound request timeout; unset, non-numeric or zero falls back to 10s
    pub fn timeout(&self) -> Duration {
        let seconds = match self.default_timeout_seconds.as_u64() {
            Some(s) if s > 0 => s,
            _ => DEFAULT_TIMEOUT_SECONDS,
        };
        Duration::from_secs(seconds)
    }
}

/// Resolve the config file location: env override, else `config.json`
/// next to the executable
pub fn default_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("config.json")))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}
