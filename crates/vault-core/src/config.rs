//! Vault configuration
//!
//! Stores non-sensitive settings in a plain JSON file next to the vault data.
//! Nothing in here is secret; it is readable while the vault is locked.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::crypto::KeyDerivationParams;
use crate::error::{Result, VaultError};
use crate::generator::{CharacterClasses, DEFAULT_LENGTH};

const CONFIG_FILE: &str = "config.json";

/// Defaults for the secret generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorDefaults {
    pub length: usize,
    #[serde(flatten)]
    pub classes: CharacterClasses,
}

impl Default for GeneratorDefaults {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            classes: CharacterClasses::default(),
        }
    }
}

/// Vault configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultConfig {
    /// Config file version
    pub version: u32,
    /// Session lifetime in minutes (0 = never expires)
    pub auto_lock_timeout_minutes: u32,
    /// Argon2id parameters for new and re-keyed accounts
    pub kdf: KeyDerivationParams,
    pub generator: GeneratorDefaults,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            version: 1,
            auto_lock_timeout_minutes: 15,
            kdf: KeyDerivationParams::default(),
            generator: GeneratorDefaults::default(),
        }
    }
}

impl VaultConfig {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let kdf = &self.kdf;
        if kdf.time_cost == 0 || kdf.parallelism == 0 {
            return Err(VaultError::InvalidConfiguration(
                "kdf timeCost and parallelism must be at least 1".to_string(),
            ));
        }
        if kdf.memory_cost < 8 * kdf.parallelism {
            return Err(VaultError::InvalidConfiguration(format!(
                "kdf memoryCost must be at least {} KiB",
                8 * kdf.parallelism
            )));
        }
        if self.generator.length == 0 {
            return Err(VaultError::InvalidConfiguration(
                "generator length must be at least 1".to_string(),
            ));
        }
        if self.generator.classes.alphabet().is_empty() {
            return Err(VaultError::InvalidConfiguration(
                "generator must enable at least one character class".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads and saves [`VaultConfig`]
pub struct ConfigManager {
    config_file: PathBuf,
    config: VaultConfig,
}

impl ConfigManager {
    /// Load config from `storage_dir`, falling back to defaults
    pub fn new(storage_dir: &Path) -> Self {
        let config_file = storage_dir.join(CONFIG_FILE);
        let config = Self::load_from_file(&config_file).unwrap_or_else(|e| {
            warn!("Ignoring unreadable config {:?}: {}", config_file, e);
            VaultConfig::default()
        });

        Self {
            config_file,
            config,
        }
    }

    fn load_from_file(path: &Path) -> Result<VaultConfig> {
        if !path.exists() {
            debug!("No config file found, using defaults");
            return Ok(VaultConfig::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: VaultConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save config to file
    pub async fn save(&self) -> Result<()> {
        self.config.validate()?;
        let contents = serde_json::to_string_pretty(&self.config)?;

        if let Some(dir) = self.config_file.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Write atomically using temp file
        let temp_path = self.config_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.config_file).await?;

        debug!("Saved config to {:?}", self.config_file);
        Ok(())
    }

    pub fn get(&self) -> &VaultConfig {
        &self.config
    }

    pub fn get_mut(&mut self) -> &mut VaultConfig {
        &mut self.config
    }

    /// Update config and save
    pub async fn update(&mut self, config: VaultConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.save().await
    }

    /// Reset to defaults and delete the config file
    pub async fn reset(&mut self) -> Result<()> {
        self.config = VaultConfig::default();

        if self.config_file.exists() {
            tokio::fs::remove_file(&self.config_file)
                .await
                .map_err(|e| VaultError::StorageError(e.to_string()))?;
        }

        Ok(())
    }
}
