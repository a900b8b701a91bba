//! JSON file storage backend
//!
//! Keeps every entry in a single `vault.json` in the data directory and
//! rewrites it atomically (temp file + rename) after each change. Entries are
//! serialized rows; secrets inside them are already ciphertext envelopes.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use super::VaultStorage;
use crate::error::{Result, VaultError};

const STORAGE_FILE: &str = "vault.json";
const FILE_VERSION: u32 = 1;

/// File format for persistent storage
#[derive(Debug, Deserialize)]
struct StorageFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// Borrowed form of [`StorageFile`] for writing
#[derive(Serialize)]
struct StorageFileRef<'a> {
    version: u32,
    entries: &'a BTreeMap<String, String>,
}

pub struct FileStorage {
    storage_dir: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) storage in `storage_dir` and load existing entries
    pub async fn open(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        tokio::fs::create_dir_all(&storage_dir).await?;

        let storage = Self {
            storage_dir,
            entries: RwLock::new(BTreeMap::new()),
        };
        storage.load().await?;

        debug!("File storage opened at: {:?}", storage.storage_dir);
        Ok(storage)
    }

    /// Get the default per-user data directory
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "symbia-labs", "secret-vault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::StorageError("Could not determine data directory".to_string())
            })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn storage_file_path(&self) -> PathBuf {
        self.storage_dir.join(STORAGE_FILE)
    }

    async fn load(&self) -> Result<()> {
        let path = self.storage_file_path();

        if !tokio::fs::try_exists(&path).await? {
            debug!("No existing storage file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: StorageFile = serde_json::from_str(&contents)?;
        if file.version != FILE_VERSION {
            return Err(VaultError::StorageError(format!(
                "Unsupported storage file version: {}",
                file.version
            )));
        }

        let mut entries = self.entries.write().await;
        *entries = file.entries;

        debug!("Loaded {} entries from storage", entries.len());
        Ok(())
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(&StorageFileRef {
            version: FILE_VERSION,
            entries,
        })?;
        let path = self.storage_file_path();

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} entries to storage", entries.len());
        Ok(())
    }
}

#[async_trait]
impl VaultStorage for FileStorage {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        self.store_many(&[(key.to_string(), value.to_vec())]).await?;

        debug!("Stored key: {}", key);
        Ok(())
    }

    async fn store_many(&self, entries: &[(String, Vec<u8>)]) -> Result<()> {
        let mut decoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let value = String::from_utf8(value.clone())
                .map_err(|_| VaultError::StorageError(format!("Value for {} is not UTF-8", key)))?;
            decoded.push((key.clone(), value));
        }

        // Hold the write lock across the save so concurrent writers serialize.
        // The map is only replaced once the file is on disk.
        let mut current = self.entries.write().await;
        let mut next = current.clone();
        next.extend(decoded);
        self.save(&next).await?;
        *current = next;

        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|v| v.clone().into_bytes()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut current = self.entries.write().await;
        if !current.contains_key(key) {
            return Ok(false);
        }

        let mut next = current.clone();
        next.remove(key);
        self.save(&next).await?;
        *current = next;

        debug!("Deleted key: {}", key);
        Ok(true)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Storage"
    }
}
