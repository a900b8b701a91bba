//! # vault-core
//!
//! Core engine for the secret vault:
//! - Argon2id key derivation with per-account salts
//! - AES-256-GCM encryption of individual secrets into text envelopes
//! - Random secret generation from the OS CSPRNG
//! - Strength scoring and vault-wide health statistics
//! - Account, session and storage plumbing around the engine

pub mod account;
pub mod config;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod health;
pub mod record;
pub mod session;
pub mod storage;
pub mod strength;
mod vault;

pub use account::Account;
pub use config::{ConfigManager, GeneratorDefaults, VaultConfig};
pub use crypto::{decrypt, derive_key, encrypt, DerivedKey, KdfProfile, KeyDerivationParams, SecretString};
pub use error::{Result, VaultError};
pub use generator::{generate, CharacterClasses};
pub use health::{aggregate, VaultHealth};
pub use record::{NewSecret, SecretRecord, SecretRow, SecretUpdate};
pub use session::VaultSession;
pub use storage::{FileStorage, MemoryStorage, VaultStorage};
pub use strength::{analyze, StrengthAssessment, StrengthLabel};
pub use vault::SecretVault;
