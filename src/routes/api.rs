use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{plugins, transaction};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transaction", get(transaction::list_transactions))
        .route("/transaction/{id}", get(transaction::transaction_status))
        .route("/plugins", get(plugins::list_plugins))
        .layer(TraceLayer::new_for_http())
}
