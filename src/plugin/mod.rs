//! Plugin model and registry
//!
//! A plugin is an external process implementing device control for one class
//! of hardware. It is registered under a unique name together with the
//! network address and transport its gRPC service listens on. The registry
//! resolves names to live plugin handles; the client module implements the
//! RPC calls those handles expose.

pub mod client;
pub mod messages;
pub mod registry;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{GatewayError, GatewayResult};
use client::{ClientError, GrpcPluginClient, PluginClient};
use messages::WriteResponse;

pub use registry::PluginRegistry;

/// Transport a plugin's gRPC service listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// TCP socket, address is `host:port`
    Tcp,
    /// Unix domain socket, address is a filesystem path
    Unix,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

impl FromStr for Transport {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "unix" => Ok(Self::Unix),
            other => Err(GatewayError::InvalidPluginAddress(format!(
                "unknown transport '{}', expected 'tcp' or 'unix'",
                other
            ))),
        }
    }
}

/// A registered backend plugin.
///
/// Holds the registration record plus the RPC client used to reach the
/// plugin. Handles are shared behind `Arc` by the registry and are immutable
/// once registered; re-registration replaces the whole handle.
pub struct Plugin {
    /// Unique plugin name, the registry key
    pub name: String,
    /// Address the plugin's gRPC service listens on
    pub address: String,
    /// Transport for the address
    pub transport: Transport,
    client: Arc<dyn PluginClient>,
}

impl Plugin {
    /// Create a plugin handle with a gRPC client for the given address.
    ///
    /// Fails only when the address is malformed for the transport; no
    /// connection is attempted here.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        transport: Transport,
        rpc_timeout: Duration,
    ) -> GatewayResult<Self> {
        let address = address.into();
        let client = GrpcPluginClient::new(&address, transport, rpc_timeout)?;
        Ok(Self {
            name: name.into(),
            address,
            transport,
            client: Arc::new(client),
        })
    }

    /// Create a plugin handle with an injected client. Used by tests and by
    /// discovery code that owns its own transport.
    pub fn with_client(
        name: impl Into<String>,
        address: impl Into<String>,
        transport: Transport,
        client: Arc<dyn PluginClient>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            transport,
            client,
        }
    }

    /// Ask this plugin for the write status of a transaction
    pub async fn check_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<WriteResponse, ClientError> {
        self.client.check_transaction(transaction_id).await
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
