//! Plugin Registry
//!
//! Process-wide mapping from plugin name to plugin handle. The registry is
//! shared by all request handlers; it is backed by DashMap so registration
//! and resolution are atomic per name and a resolver never observes a
//! partially-updated entry.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use super::client::PluginClient;
use super::{Plugin, Transport};
use crate::errors::GatewayResult;

/// Central plugin registry.
///
/// Registration is an idempotent upsert keyed by plugin name: registering a
/// name that already exists replaces the prior entry, and at most one
/// registration per name exists at any time.
pub struct PluginRegistry {
    plugins: DashMap<String, Arc<Plugin>>,
    rpc_timeout: Duration,
}

impl PluginRegistry {
    /// Create an empty registry. The timeout bounds every RPC made through
    /// handles this registry creates.
    pub fn new(rpc_timeout: Duration) -> Self {
        Self {
            plugins: DashMap::new(),
            rpc_timeout,
        }
    }

    /// Register a plugin reachable at the given address.
    ///
    /// Fails only when the address is malformed for the transport. An
    /// existing registration under the same name is replaced.
    pub fn register(
        &self,
        name: &str,
        address: &str,
        transport: Transport,
    ) -> GatewayResult<()> {
        let plugin = Plugin::new(name, address, transport, self.rpc_timeout)?;
        let replaced = self
            .plugins
            .insert(name.to_string(), Arc::new(plugin))
            .is_some();

        tracing::debug!(
            plugin = %name,
            address = %address,
            transport = %transport,
            replaced,
            "Registered plugin"
        );
        Ok(())
    }

    /// Register an already-constructed plugin handle, e.g. one carrying an
    /// injected client
    pub fn register_plugin(&self, plugin: Plugin) {
        let name = plugin.name.clone();
        let replaced = self.plugins.insert(name.clone(), Arc::new(plugin)).is_some();
        tracing::debug!(plugin = %name, replaced, "Registered plugin handle");
    }

    /// Remove a plugin registration. No-op when the name is absent; returns
    /// whether an entry was removed.
    pub fn deregister(&self, name: &str) -> bool {
        let removed = self.plugins.remove(name).is_some();
        if removed {
            tracing::debug!(plugin = %name, "Deregistered plugin");
        }
        removed
    }

    /// Resolve a plugin handle by name
    pub fn resolve(&self, name: &str) -> Option<Arc<Plugin>> {
        self.plugins.get(name).map(|entry| entry.value().clone())
    }

    /// Names of all currently registered plugins
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Snapshot of all registered plugin handles
    pub fn all(&self) -> Vec<Arc<Plugin>> {
        self.plugins
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry has no plugins
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Register a plugin with an injected client, keeping name/address
    /// bookkeeping consistent with [`register`](Self::register)
    pub fn register_with_client(
        &self,
        name: &str,
        address: &str,
        transport: Transport,
        client: Arc<dyn PluginClient>,
    ) {
        self.register_plugin(Plugin::with_client(name, address, transport, client));
    }
}
