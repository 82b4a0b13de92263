use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use crate::plugin::Transport;

/// YAML configuration file model. Every field is optional; missing values
/// fall back to environment variables and then defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Transaction cache TTL, in seconds
    pub transaction_ttl_secs: Option<u64>,
    /// Per-RPC timeout for plugin calls, in seconds
    pub rpc_timeout_secs: Option<u64>,
    /// Background task pool worker count
    pub workers: Option<usize>,
    /// Plugins to register at startup
    #[serde(default)]
    pub plugins: Vec<YamlPlugin>,
}

/// A plugin registration entry in the YAML file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlPlugin {
    pub name: String,
    pub address: String,
    pub transport: Transport,
}

/// Load and parse a YAML configuration file
pub fn load(path: &Path) -> Result<YamlConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
}
