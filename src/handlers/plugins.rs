//! Plugin discovery endpoint
//!
//! Lets SDKs and dashboards see which backend plugins the gateway currently
//! routes to, and where they live.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::plugin::{PluginRegistry, Transport};
use crate::state::AppState;

/// A registered plugin as exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    /// Unique plugin name
    pub name: String,
    /// Address the plugin's RPC service listens on
    pub address: String,
    /// Transport for the address
    pub transport: Transport,
}

/// Build the plugin listing from registry contents
pub fn plugin_listing(registry: &PluginRegistry) -> Vec<PluginInfo> {
    let mut listing: Vec<PluginInfo> = registry
        .all()
        .into_iter()
        .map(|plugin| PluginInfo {
            name: plugin.name.clone(),
            address: plugin.address.clone(),
            transport: plugin.transport,
        })
        .collect();
    listing.sort_by(|a, b| a.name.cmp(&b.name));
    listing
}

/// `GET /plugins` - list all registered plugins
pub async fn list_plugins(State(state): State<Arc<AppState>>) -> Json<Vec<PluginInfo>> {
    Json(plugin_listing(&state.registry))
}
