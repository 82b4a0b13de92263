//! Gateway configuration
//!
//! Configuration is loaded from environment variables with an optional YAML
//! file on top. Priority: YAML > environment variables > defaults. A `.env`
//! file, if present, is loaded into the environment by `main` before any of
//! this runs.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

mod yaml;

pub use yaml::{YamlConfig, YamlPlugin};

use crate::cache::DEFAULT_TRANSACTION_TTL;
use crate::plugin::Transport;

/// Default HTTP bind host
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP bind port
const DEFAULT_PORT: u16 = 5000;

/// Default per-RPC timeout for plugin calls
const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(3);

/// Default background task pool worker count
const DEFAULT_WORKERS: usize = 8;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, String),

    #[error("failed to parse config file {0}: {1}")]
    Parse(String, String),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// A plugin to register at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEndpoint {
    pub name: String,
    pub address: String,
    pub transport: Transport,
}

/// Server configuration shared through [`AppState`](crate::state::AppState)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP bind host
    pub host: String,
    /// HTTP bind port
    pub port: u16,
    /// Lifetime of transaction cache records
    pub transaction_ttl: Duration,
    /// Timeout bounding each plugin RPC, including connection establishment
    pub rpc_timeout: Duration,
    /// Worker count for the background task pool
    pub workers: usize,
    /// Plugins registered at startup
    pub plugins: Vec<PluginEndpoint>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            transaction_ttl: DEFAULT_TRANSACTION_TTL,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            workers: DEFAULT_WORKERS,
            plugins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("GATEWAY_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("GATEWAY_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid("GATEWAY_PORT", port.clone()))?;
        }
        if let Ok(ttl) = std::env::var("GATEWAY_TRANSACTION_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .map_err(|_| ConfigError::Invalid("GATEWAY_TRANSACTION_TTL_SECS", ttl.clone()))?;
            config.transaction_ttl = Duration::from_secs(secs);
        }
        if let Ok(timeout) = std::env::var("GATEWAY_RPC_TIMEOUT_SECS") {
            let secs: u64 = timeout
                .parse()
                .map_err(|_| ConfigError::Invalid("GATEWAY_RPC_TIMEOUT_SECS", timeout.clone()))?;
            config.rpc_timeout = Duration::from_secs(secs);
        }
        if let Ok(workers) = std::env::var("GATEWAY_WORKERS") {
            config.workers = workers
                .parse()
                .map_err(|_| ConfigError::Invalid("GATEWAY_WORKERS", workers.clone()))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file layered over environment
    /// variables
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        let file = yaml::load(path)?;

        if let Some(host) = file.host {
            config.host = host;
        }
        if let Some(port) = file.port {
            config.port = port;
        }
        if let Some(secs) = file.transaction_ttl_secs {
            config.transaction_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = file.rpc_timeout_secs {
            config.rpc_timeout = Duration::from_secs(secs);
        }
        if let Some(workers) = file.workers {
            config.workers = workers;
        }
        config.plugins = file
            .plugins
            .into_iter()
            .map(|p| PluginEndpoint {
                name: p.name,
                address: p.address,
                transport: p.transport,
            })
            .collect();

        config.validate()?;
        Ok(config)
    }

    /// Address string the HTTP listener binds to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.transaction_ttl.is_zero() {
            return Err(ConfigError::Invalid(
                "transaction_ttl",
                "must be greater than zero".to_string(),
            ));
        }
        if self.rpc_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "rpc_timeout",
                "must be greater than zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid(
                "workers",
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
