//! Transaction cache
//!
//! Process-wide, time-bounded store for in-flight and recently-completed
//! asynchronous write transactions. Every record maps a transaction id to
//! the plugin that owns the write plus the opaque invocation context the
//! caller supplied. Records expire after a configurable TTL; an expired
//! record is never returned by `get` or `enumerate`.
//!
//! The cache is the sole owner of transaction records. Handlers receive
//! shared read-only views (`Arc<TransactionRecord>`); there is no explicit
//! delete operation, records leave the cache only through expiry.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use moka::future::Cache;
use serde_json::Value;

/// Default record lifetime: long enough to poll a slow hardware write to
/// completion, short enough to bound memory
pub const DEFAULT_TRANSACTION_TTL: Duration = Duration::from_secs(300);

/// A tracked asynchronous write operation
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    /// Unique transaction id
    pub id: String,
    /// Name of the plugin executing the write, if known
    pub plugin: Option<String>,
    /// Opaque invocation metadata, e.g. the requested action and raw payload
    pub context: Value,
    /// When this record entered the cache
    pub created_at: SystemTime,
}

/// TTL-bounded transaction store.
///
/// Safe for concurrent use from many tasks: inserts for a given id are
/// linearizable with respect to `get`/`enumerate` of that id, and concurrent
/// `add` calls for the same id resolve to exactly one winner.
pub struct TransactionCache {
    inner: Cache<String, Arc<TransactionRecord>>,
}

impl TransactionCache {
    /// Create a cache whose records live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Insert a new transaction record with a fresh creation timestamp.
    ///
    /// First writer wins: returns `true` when this call inserted the record,
    /// `false` when an unexpired record with the same id already exists. An
    /// existing record is never overwritten.
    pub async fn add(&self, id: &str, context: Value, plugin: Option<&str>) -> bool {
        let record = Arc::new(TransactionRecord {
            id: id.to_string(),
            plugin: plugin.map(str::to_string),
            context,
            created_at: SystemTime::now(),
        });

        let entry = self.inner.entry(id.to_string()).or_insert(record).await;
        entry.is_fresh()
    }

    /// Look up a transaction record. Returns `None` for absent and expired
    /// records alike.
    pub async fn get(&self, id: &str) -> Option<Arc<TransactionRecord>> {
        self.inner.get(id).await
    }

    /// Ids of all currently unexpired records. Order is not stable across
    /// calls.
    pub async fn enumerate(&self) -> Vec<String> {
        // Flush pending internal maintenance so recently-expired entries do
        // not linger in the iterator.
        self.inner.run_pending_tasks().await;
        self.inner.iter().map(|(id, _)| (*id).clone()).collect()
    }

    /// Number of unexpired records
    pub async fn len(&self) -> usize {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count() as usize
    }

    /// Whether the cache holds no unexpired records
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TransactionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSACTION_TTL)
    }
}
