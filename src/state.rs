//! Shared application state
//!
//! One `AppState` is constructed at startup and shared by reference with
//! every request handler. The registry and transaction cache inside it are
//! the process-wide singletons the command core operates on; tests build
//! fresh instances for isolation instead of reaching for globals.

use std::sync::Arc;

use crate::cache::TransactionCache;
use crate::config::ServerConfig;
use crate::plugin::PluginRegistry;
use crate::tasks::TaskPool;

/// Process-wide state shared by all request handlers
pub struct AppState {
    /// Loaded server configuration
    pub config: ServerConfig,
    /// Known backend plugins
    pub registry: PluginRegistry,
    /// Tracked asynchronous write transactions
    pub transactions: TransactionCache,
    /// Pool for blocking background work (discovery, registration probes)
    pub tasks: TaskPool,
}

impl AppState {
    /// Build state from configuration. Plugins listed in the config are not
    /// registered here; startup does that via
    /// [`init::register_configured_plugins`](crate::init::register_configured_plugins).
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            registry: PluginRegistry::new(config.rpc_timeout),
            transactions: TransactionCache::new(config.transaction_ttl),
            tasks: TaskPool::new(config.workers),
            config,
        })
    }
}
