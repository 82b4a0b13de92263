//! Transaction command handler
//!
//! Implements the "check transaction" command: without an id it lists every
//! transaction the cache currently tracks; with an id it resolves the
//! owning plugin and asks it for the write status over RPC.
//!
//! The handler is stateless. Everything it knows between invocations lives
//! in the transaction cache, so it is safe to call concurrently from any
//! number of request tasks.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::cache::TransactionCache;
use crate::errors::{GatewayError, GatewayResult};
use crate::plugin::PluginRegistry;
use crate::plugin::messages::WriteResponse;
use crate::state::AppState;

/// Single-transaction view returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionStatus {
    /// The transaction id
    pub id: String,
    /// Invocation context recorded when the write was dispatched
    pub context: Value,
    /// Write state: "ok" or "error"
    pub state: String,
    /// Write status: "unknown", "pending", "writing", or "done"
    pub status: String,
    /// Plugin-reported creation timestamp, passed through verbatim
    pub created: String,
    /// Plugin-reported update timestamp, passed through verbatim
    pub updated: String,
    /// Error message from the plugin, empty when the write is healthy
    pub message: String,
}

impl TransactionStatus {
    /// Build the response view from a plugin reply
    fn from_reply(id: &str, context: Value, reply: &WriteResponse) -> Self {
        Self {
            id: id.to_string(),
            context,
            state: write_state_name(reply.state).to_string(),
            status: write_status_name(reply.status).to_string(),
            created: reply.created.clone(),
            updated: reply.updated.clone(),
            message: reply.message.clone(),
        }
    }
}

/// Map a plugin write-status code to its human-readable name
pub fn write_status_name(code: u32) -> &'static str {
    match code {
        1 => "pending",
        2 => "writing",
        3 => "done",
        _ => "unknown",
    }
}

/// Map a plugin write-state code to its human-readable name
pub fn write_state_name(code: u32) -> &'static str {
    match code {
        0 => "ok",
        _ => "error",
    }
}

/// Result of a check-transaction command: either the ids of all tracked
/// transactions or the status of one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckTransaction {
    /// Ids of all currently tracked transactions
    List(Vec<String>),
    /// Status of the requested transaction
    Status(TransactionStatus),
}

/// The check-transaction command.
///
/// With no id, returns the list view built from the cache; no plugin is
/// contacted. With an id, resolves the record's owning plugin through the
/// registry and issues the status-check RPC. A record whose owning plugin
/// cannot be determined is reported as not found; the gateway does not
/// broadcast the query to all known plugins.
pub async fn check_transaction(
    registry: &PluginRegistry,
    cache: &TransactionCache,
    transaction_id: Option<&str>,
) -> GatewayResult<CheckTransaction> {
    let Some(transaction_id) = transaction_id else {
        return Ok(CheckTransaction::List(cache.enumerate().await));
    };

    let record = cache.get(transaction_id).await.ok_or_else(|| {
        GatewayError::TransactionNotFound(format!(
            "no transaction with id {}",
            transaction_id
        ))
    })?;

    let plugin_name = record
        .plugin
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            GatewayError::TransactionNotFound(format!(
                "unable to determine managing plugin for transaction {}",
                transaction_id
            ))
        })?;

    let plugin = registry.resolve(plugin_name).ok_or_else(|| {
        GatewayError::PluginNotFound(format!("no plugin named {}", plugin_name))
    })?;

    let reply = plugin
        .check_transaction(transaction_id)
        .await
        .map_err(|e| GatewayError::FailedTransactionCommand(e.to_string()))?;

    tracing::debug!(
        transaction = %transaction_id,
        plugin = %plugin_name,
        status = reply.status,
        state = reply.state,
        "Checked transaction"
    );

    Ok(CheckTransaction::Status(TransactionStatus::from_reply(
        transaction_id,
        record.context.clone(),
        &reply,
    )))
}

/// Record a newly-dispatched asynchronous write and return its id.
///
/// This is the sole entry point through which the command-dispatch path
/// creates transaction records. Ids are uuid-v4 strings; on the vanishingly
/// rare collision with a live record, a fresh id is drawn.
pub async fn new_transaction(cache: &TransactionCache, context: Value, plugin: &str) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if cache.add(&id, context.clone(), Some(plugin)).await {
            return id;
        }
    }
}

/// `GET /transaction` - list all tracked transaction ids
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> GatewayResult<Json<CheckTransaction>> {
    let result = check_transaction(&state.registry, &state.transactions, None).await?;
    Ok(Json(result))
}

/// `GET /transaction/{id}` - check one transaction's write status
pub async fn transaction_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> GatewayResult<Json<CheckTransaction>> {
    let result = check_transaction(&state.registry, &state.transactions, Some(&id)).await?;
    Ok(Json(result))
}
