//! Vault accounts
//!
//! An account owns its key-derivation profile and a verifier: a known
//! constant encrypted under the derived key. Decrypting the verifier at
//! unlock time tells a wrong master passphrase apart from a damaged record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::crypto::{decrypt, derive_key, encrypt, DerivedKey, KdfProfile, KeyDerivationParams};
use crate::error::{Result, VaultError};

const VERIFIER_PLAINTEXT: &str = "secret-vault-verification";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    /// Salt and cost parameters for this account's key
    pub kdf: KdfProfile,
    /// Envelope of a known constant under the account key
    pub verifier: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create an account with a fresh salt; returns the account and its key
    pub fn create(
        username: &str,
        passphrase: &str,
        params: KeyDerivationParams,
    ) -> Result<(Self, DerivedKey)> {
        let username = username.trim();
        if username.is_empty() {
            return Err(VaultError::InvalidInput("username must not be empty".to_string()));
        }

        let kdf = KdfProfile::generate(params);
        let key = derive_key(passphrase, &kdf)?;
        let verifier = encrypt(VERIFIER_PLAINTEXT, &key)?;

        let account = Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            kdf,
            verifier,
            created_at: Utc::now(),
        };
        debug!("Created account {}", account.id);
        Ok((account, key))
    }

    /// Derive the account key and check it against the verifier
    pub fn derive_verified_key(&self, passphrase: &str) -> Result<DerivedKey> {
        let key = derive_key(passphrase, &self.kdf)?;
        if self.verify_key(&key)? {
            Ok(key)
        } else {
            Err(VaultError::InvalidPassphrase)
        }
    }

    /// Whether `key` opens this account's verifier
    pub fn verify_key(&self, key: &DerivedKey) -> Result<bool> {
        match decrypt(&self.verifier, key) {
            Ok(plaintext) => Ok(plaintext == VERIFIER_PLAINTEXT),
            Err(VaultError::DecryptionError(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Replace the profile and verifier for a new passphrase
    ///
    /// Records encrypted under the old key must be re-encrypted by the caller.
    pub fn rekey(&mut self, passphrase: &str, params: KeyDerivationParams) -> Result<DerivedKey> {
        let kdf = KdfProfile::generate(params);
        let key = derive_key(passphrase, &kdf)?;
        self.verifier = encrypt(VERIFIER_PLAINTEXT, &key)?;
        self.kdf = kdf;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KeyDerivationParams {
        KeyDerivationParams {
            memory_cost: 8192,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_create_and_unlock() {
        let (account, key) = Account::create("alice", "correct horse", fast_params()).unwrap();

        let unlocked = account.derive_verified_key("correct horse").unwrap();
        assert_eq!(unlocked.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_wrong_passphrase() {
        let (account, _) = Account::create("alice", "correct horse", fast_params()).unwrap();

        let result = account.derive_verified_key("battery staple");
        assert!(matches!(result, Err(VaultError::InvalidPassphrase)));
    }

    #[test]
    fn test_same_passphrase_different_accounts() {
        let (_, key1) = Account::create("alice", "shared", fast_params()).unwrap();
        let (_, key2) = Account::create("bob", "shared", fast_params()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_blank_username_rejected() {
        assert!(matches!(
            Account::create("  ", "pass", fast_params()),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let result = Account::create("alice", "", fast_params());
        assert!(matches!(result, Err(VaultError::EmptyPassphrase)));
    }

    #[test]
    fn test_corrupted_verifier_is_an_encoding_error() {
        let (mut account, _) = Account::create("alice", "pass", fast_params()).unwrap();
        account.verifier = "broken".to_string();

        let result = account.derive_verified_key("pass");
        assert!(matches!(result, Err(VaultError::EncodingError(_))));
    }

    #[test]
    fn test_rekey() {
        let (mut account, old_key) = Account::create("alice", "old", fast_params()).unwrap();
        let old_salt = account.kdf.salt.clone();

        let new_key = account.rekey("new", fast_params()).unwrap();

        assert_ne!(account.kdf.salt, old_salt);
        assert!(!account.verify_key(&old_key).unwrap());
        assert!(account.verify_key(&new_key).unwrap());
        assert!(matches!(
            account.derive_verified_key("old"),
            Err(VaultError::InvalidPassphrase)
        ));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let (account, _) = Account::create("alice", "pass", fast_params()).unwrap();

        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("\"kdf\""));
        assert!(!json.contains("pass\""));

        let parsed: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, account);
    }
}
