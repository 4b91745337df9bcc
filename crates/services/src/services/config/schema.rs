use serde::{Deserialize, Serialize};

pub const CURRENT_CONFIG_VERSION: &str = "v1";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: String,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION.to_string(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Parses a raw config file, falling back to defaults when the file is
    /// unreadable or from an unknown version.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str::<Config>(raw) {
            Ok(config) if config.config_version == CURRENT_CONFIG_VERSION => config,
            Ok(config) => {
                tracing::warn!(
                    "Unknown config version {:?}; resetting to defaults",
                    config.config_version
                );
                Config::default()
            }
            Err(err) => {
                tracing::warn!("Failed to parse config file: {}; using defaults", err);
                Config::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.config_version = CURRENT_CONFIG_VERSION.to_string();
        self
    }
}
