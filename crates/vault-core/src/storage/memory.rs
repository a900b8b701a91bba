//! In-memory storage backend, mostly for tests and ephemeral vaults

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::VaultStorage;
use crate::error::Result;

#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultStorage for MemoryStorage {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn store_many(&self, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "Memory Storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_retrieve_delete() {
        let storage = MemoryStorage::new();

        storage.store("k", b"v").await.unwrap();
        assert_eq!(storage.retrieve("k").await.unwrap(), Some(b"v".to_vec()));

        assert!(storage.delete("k").await.unwrap());
        assert!(!storage.delete("k").await.unwrap());
        assert_eq!(storage.retrieve("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_keys_by_prefix() {
        let storage = MemoryStorage::new();

        storage.store("secret:b", b"2").await.unwrap();
        storage.store("secret:a", b"1").await.unwrap();
        storage.store("account:x", b"3").await.unwrap();
        storage.store("secrets", b"4").await.unwrap();

        let keys = storage.list_keys("secret:").await.unwrap();
        assert_eq!(keys, vec!["secret:a".to_string(), "secret:b".to_string()]);
    }

    #[tokio::test]
    async fn test_store_many() {
        let storage = MemoryStorage::new();
        storage.store("a", b"old").await.unwrap();

        storage
            .store_many(&[("a".to_string(), b"new".to_vec()), ("b".to_string(), b"2".to_vec())])
            .await
            .unwrap();

        assert_eq!(storage.retrieve("a").await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(storage.retrieve("b").await.unwrap(), Some(b"2".to_vec()));
    }
}
