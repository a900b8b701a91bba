//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Master passphrase must not be empty")]
    EmptyPassphrase,

    #[error("Invalid master passphrase")]
    InvalidPassphrase,

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Malformed ciphertext envelope: {0}")]
    EncodingError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Session expired; unlock again")]
    SessionExpired,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Secret not found: {0}")]
    RecordNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
