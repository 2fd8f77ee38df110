//! Ordered key-value table abstraction
//!
//! The ledger keeps each logical table (`unspent`, `transactions`, `pending`)
//! in its own store. Keys are strings ordered byte-wise; values are JSON documents.

use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use tokio::sync::Mutex;

use super::persistence::StorageError;

/// An ordered key-value table.
///
/// Operations are asynchronous and may suspend. Missing keys are not errors:
/// `get` returns `None` and `delete` is a no-op.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StorageError>> + Send;

    fn put(&self, key: &str, value: Value)
        -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// All entries in ascending key order
    fn entries(&self) -> impl Future<Output = Result<Vec<(String, Value)>, StorageError>> + Send;
}

/// In-memory table, used for tests and ephemeral wallets
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>, StorageError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.put("a", json!({ "value": 1 })).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({ "value": 1 })));

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_ordered_by_key() {
        let store = MemoryStore::new();
        for key in ["ff00", "0a", "1b", "0a01"] {
            store.put(key, json!(key)).await.unwrap();
        }
        let keys: Vec<String> = store.entries().await.unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["0a", "0a01", "1b", "ff00"]);
    }
}
