//! End-to-end transaction command scenarios
//!
//! Drives the check-transaction command against a real registry and cache,
//! substituting fake plugin clients for the gRPC transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use sensor_gateway::cache::TransactionCache;
use sensor_gateway::errors::GatewayError;
use sensor_gateway::handlers::transaction::{CheckTransaction, check_transaction, new_transaction};
use sensor_gateway::plugin::client::{ClientError, PluginClient};
use sensor_gateway::plugin::messages::WriteResponse;
use sensor_gateway::plugin::{PluginRegistry, Transport};

/// Plugin client double that returns a canned reply or a canned failure
struct FakePluginClient {
    reply: Result<WriteResponse, ClientError>,
}

impl FakePluginClient {
    fn replying(reply: WriteResponse) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply) })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(ClientError::Transport(message.to_string())),
        })
    }
}

#[async_trait]
impl PluginClient for FakePluginClient {
    async fn check_transaction(&self, _transaction_id: &str) -> Result<WriteResponse, ClientError> {
        self.reply.clone()
    }
}

fn registry() -> PluginRegistry {
    PluginRegistry::new(Duration::from_secs(3))
}

#[tokio::test]
async fn empty_cache_lists_no_transactions() {
    let registry = registry();
    let cache = TransactionCache::default();

    let result = check_transaction(&registry, &cache, None).await.unwrap();
    assert_eq!(result, CheckTransaction::List(vec![]));
}

#[tokio::test]
async fn tracked_transaction_appears_in_list() {
    let registry = registry();
    let cache = TransactionCache::default();

    let ok = cache
        .add("abc123", json!({"some": "ctx"}), Some("test-plugin"))
        .await;
    assert!(ok);

    let result = check_transaction(&registry, &cache, None).await.unwrap();
    assert_eq!(result, CheckTransaction::List(vec!["abc123".to_string()]));
}

#[tokio::test]
async fn successful_status_check_maps_the_reply() {
    let registry = registry();
    let cache = TransactionCache::default();

    cache
        .add("foo", json!({"action": "foo", "raw": "bar"}), Some("foo"))
        .await;
    registry.register_with_client(
        "foo",
        "localhost:9999",
        Transport::Tcp,
        FakePluginClient::replying(WriteResponse {
            created: "october".to_string(),
            updated: "november".to_string(),
            status: 3,
            state: 0,
            message: String::new(),
        }),
    );

    let result = check_transaction(&registry, &cache, Some("foo"))
        .await
        .unwrap();

    let CheckTransaction::Status(status) = result else {
        panic!("expected a single-transaction response");
    };
    assert_eq!(status.id, "foo");
    assert_eq!(status.context, json!({"action": "foo", "raw": "bar"}));
    assert_eq!(status.state, "ok");
    assert_eq!(status.status, "done");
    assert_eq!(status.created, "october");
    assert_eq!(status.updated, "november");
    assert_eq!(status.message, "");
}

#[tokio::test]
async fn pending_status_with_error_state_maps_the_reply() {
    let registry = registry();
    let cache = TransactionCache::default();

    cache.add("foo", json!({}), Some("foo")).await;
    registry.register_with_client(
        "foo",
        "localhost:9999",
        Transport::Tcp,
        FakePluginClient::replying(WriteResponse {
            created: "t0".to_string(),
            updated: "t1".to_string(),
            status: 1,
            state: 4,
            message: "device busy".to_string(),
        }),
    );

    let result = check_transaction(&registry, &cache, Some("foo"))
        .await
        .unwrap();

    let CheckTransaction::Status(status) = result else {
        panic!("expected a single-transaction response");
    };
    assert_eq!(status.status, "pending");
    assert_eq!(status.state, "error");
    assert_eq!(status.message, "device busy");
}

#[tokio::test]
async fn transport_failure_surfaces_as_failed_transaction_command() {
    let registry = registry();
    let cache = TransactionCache::default();

    cache.add("foo", json!({}), Some("foo")).await;
    registry.register_with_client(
        "foo",
        "localhost:9999",
        Transport::Tcp,
        FakePluginClient::failing("connection refused"),
    );

    let err = check_transaction(&registry, &cache, Some("foo"))
        .await
        .unwrap_err();

    let GatewayError::FailedTransactionCommand(message) = err else {
        panic!("expected FailedTransactionCommand, got {:?}", err);
    };
    assert!(message.contains("connection refused"));
}

#[tokio::test]
async fn rpc_timeout_surfaces_as_failed_transaction_command() {
    // A listener that accepts connections and then never speaks, so the
    // call can only end when the client's deadline fires.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            match listener.accept().await {
                Ok((stream, _)) => held.push(stream),
                Err(_) => return,
            }
        }
    });

    let registry = PluginRegistry::new(Duration::from_millis(100));
    registry
        .register("slow", &address, Transport::Tcp)
        .unwrap();

    let cache = TransactionCache::default();
    cache.add("stuck", json!({}), Some("slow")).await;

    let err = check_transaction(&registry, &cache, Some("stuck"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::FailedTransactionCommand(_)));
}

#[tokio::test]
async fn unregistered_plugin_surfaces_as_plugin_not_found() {
    let registry = registry();
    let cache = TransactionCache::default();

    cache.add("bar", json!({}), Some("bar")).await;

    let err = check_transaction(&registry, &cache, Some("bar"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::PluginNotFound("no plugin named bar".to_string())
    );
}

#[tokio::test]
async fn unknown_transaction_surfaces_as_transaction_not_found() {
    let registry = registry();
    let cache = TransactionCache::default();

    let err = check_transaction(&registry, &cache, Some("nonexistent"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::TransactionNotFound("no transaction with id nonexistent".to_string())
    );
}

#[tokio::test]
async fn record_without_owning_plugin_is_reported_not_found() {
    let registry = registry();
    let cache = TransactionCache::default();

    cache.add("orphan", json!({}), None).await;

    let err = check_transaction(&registry, &cache, Some("orphan"))
        .await
        .unwrap_err();

    // Policy: a record whose owning plugin is unknown is indistinguishable
    // from one that never existed. It must not surface as a different kind.
    assert!(matches!(err, GatewayError::TransactionNotFound(_)));
}

#[tokio::test]
async fn record_with_empty_plugin_name_is_reported_not_found() {
    let registry = registry();
    let cache = TransactionCache::default();

    cache.add("orphan", json!({}), Some("")).await;

    let err = check_transaction(&registry, &cache, Some("orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::TransactionNotFound(_)));
}

#[tokio::test]
async fn expired_transaction_is_reported_not_found() {
    let registry = registry();
    let cache = TransactionCache::new(Duration::from_millis(50));

    cache.add("ephemeral", json!({}), Some("p")).await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    let err = check_transaction(&registry, &cache, Some("ephemeral"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::TransactionNotFound(_)));

    let result = check_transaction(&registry, &cache, None).await.unwrap();
    assert_eq!(result, CheckTransaction::List(vec![]));
}

#[tokio::test]
async fn dispatch_hook_creates_pollable_transactions() {
    let registry = registry();
    let cache = TransactionCache::default();

    registry.register_with_client(
        "led-plugin",
        "localhost:9999",
        Transport::Tcp,
        FakePluginClient::replying(WriteResponse {
            created: "t0".to_string(),
            updated: "t0".to_string(),
            status: 2,
            state: 0,
            message: String::new(),
        }),
    );

    let id = new_transaction(&cache, json!({"action": "state", "raw": "on"}), "led-plugin").await;

    let result = check_transaction(&registry, &cache, Some(&id))
        .await
        .unwrap();
    let CheckTransaction::Status(status) = result else {
        panic!("expected a single-transaction response");
    };
    assert_eq!(status.id, id);
    assert_eq!(status.status, "writing");
    assert_eq!(status.state, "ok");
}
