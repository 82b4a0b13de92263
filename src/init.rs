//! Startup initialization
//!
//! Registers the plugins named in the configuration so the gateway can route
//! commands from the first request. A plugin with a bad address is logged
//! and skipped rather than failing startup; the rest of the fleet stays
//! reachable.

use crate::config::ServerConfig;
use crate::plugin::PluginRegistry;

/// Register every plugin listed in the configuration
pub fn register_configured_plugins(config: &ServerConfig, registry: &PluginRegistry) {
    for endpoint in &config.plugins {
        match registry.register(&endpoint.name, &endpoint.address, endpoint.transport) {
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(
                    plugin = %endpoint.name,
                    address = %endpoint.address,
                    error = %e,
                    "Skipping plugin with invalid registration"
                );
            }
        }
    }

    tracing::info!(
        plugin_count = registry.len(),
        "Plugin registry initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginEndpoint;
    use crate::plugin::Transport;
    use std::time::Duration;

    #[tokio::test]
    async fn test_configured_plugins_are_registered() {
        let config = ServerConfig {
            plugins: vec![
                PluginEndpoint {
                    name: "emulator".to_string(),
                    address: "localhost:5001".to_string(),
                    transport: Transport::Tcp,
                },
                PluginEndpoint {
                    name: "i2c".to_string(),
                    address: "/tmp/i2c.sock".to_string(),
                    transport: Transport::Unix,
                },
            ],
            ..Default::default()
        };
        let registry = PluginRegistry::new(Duration::from_secs(3));

        register_configured_plugins(&config, &registry);

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("emulator").is_some());
        assert!(registry.resolve("i2c").is_some());
    }

    #[tokio::test]
    async fn test_invalid_plugin_is_skipped_not_fatal() {
        let config = ServerConfig {
            plugins: vec![
                PluginEndpoint {
                    name: "bad".to_string(),
                    address: "not a valid address".to_string(),
                    transport: Transport::Tcp,
                },
                PluginEndpoint {
                    name: "good".to_string(),
                    address: "localhost:5001".to_string(),
                    transport: Transport::Tcp,
                },
            ],
            ..Default::default()
        };
        let registry = PluginRegistry::new(Duration::from_secs(3));

        register_configured_plugins(&config, &registry);

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("bad").is_none());
        assert!(registry.resolve("good").is_some());
    }
}
