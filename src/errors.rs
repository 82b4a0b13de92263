//! Gateway error types
//!
//! Centralized error taxonomy for the command-handling core. Every error
//! raised by the transaction command handler is one of these kinds, and the
//! route layer serializes them without changing the kind.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error type for the gateway command-handling core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Board/device identifier out of numeric range, malformed byte width,
    /// or a byte conversion was requested for a non-hex alias
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Requested transaction is absent from the cache, or present but
    /// missing an owning plugin
    #[error("{0}")]
    TransactionNotFound(String),

    /// The transaction's owning plugin is not currently registered
    #[error("{0}")]
    PluginNotFound(String),

    /// Transport-level failure or timeout while contacting the resolved
    /// plugin; the underlying message is preserved for diagnostics
    #[error("failed transaction command: {0}")]
    FailedTransactionCommand(String),

    /// Plugin registration was given an address the transport cannot use
    #[error("invalid plugin address: {0}")]
    InvalidPluginAddress(String),
}

impl GatewayError {
    /// Stable machine-readable kind, used in serialized error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::TransactionNotFound(_) => "transaction_not_found",
            Self::PluginNotFound(_) => "plugin_not_found",
            Self::FailedTransactionCommand(_) => "failed_transaction_command",
            Self::InvalidPluginAddress(_) => "invalid_plugin_address",
        }
    }

    /// HTTP status the route layer maps this error to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier(_) | Self::InvalidPluginAddress(_) => StatusCode::BAD_REQUEST,
            Self::TransactionNotFound(_) | Self::PluginNotFound(_) => StatusCode::NOT_FOUND,
            Self::FailedTransactionCommand(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}
