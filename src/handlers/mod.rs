//! HTTP request handlers
//!
//! Thin axum wrappers over the command-handling core. The command functions
//! themselves take the registry and cache directly so tests can drive them
//! without a server.

pub mod plugins;
pub mod transaction;
