//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Key/value persistence for accounts and secret rows
///
/// Values are opaque bytes. Secrets reach a backend only as ciphertext
/// envelopes inside serialized rows.
#[async_trait]
pub trait VaultStorage: Send + Sync {
    /// Store a value with the given key, replacing any previous value
    async fn store(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Store several values as one change: either all of them land or none do
    async fn store_many(&self, entries: &[(String, Vec<u8>)]) -> Result<()>;

    /// Retrieve a value by key
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a value by key; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// List all keys with a given prefix, sorted
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
