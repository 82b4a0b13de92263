pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ident;
pub mod init;
pub mod plugin;
pub mod routes;
pub mod state;
pub mod tasks;

// Re-export commonly used items for convenience
pub use cache::TransactionCache;
pub use config::ServerConfig;
pub use errors::{GatewayError, GatewayResult};
pub use plugin::PluginRegistry;
pub use state::AppState;
pub use tasks::TaskPool;
