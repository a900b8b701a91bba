//! Passphrase-based key derivation using Argon2id
//!
//! Every account carries its own [`KdfProfile`]: a random salt plus the
//! Argon2id cost parameters that were current when the profile was created.
//! Costs can be raised later: accounts whose stored costs fall below the
//! configured ones are re-keyed on their next passphrase change. The profile
//! format version is checked by [`derive_key`].

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::DerivedKey;
use crate::error::{Result, VaultError};

/// Profile format version understood by [`derive_key`]
pub const KDF_VERSION: u32 = 1;

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// Shortest salt Argon2 accepts
const MIN_SALT_LEN: usize = 8;

/// Parameters for Argon2id key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KeyDerivationParams {
    /// True if any cost in `self` is below the matching cost in `other`
    pub fn is_weaker_than(&self, other: &KeyDerivationParams) -> bool {
        self.memory_cost < other.memory_cost
            || self.time_cost < other.time_cost
            || self.parallelism < other.parallelism
    }

    fn to_argon2(self) -> Result<Params> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, Some(32))
            .map_err(|e| VaultError::KeyDerivationError(e.to_string()))
    }
}

/// Per-account derivation parameters, persisted with the account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfProfile {
    /// Profile format version
    pub version: u32,
    /// Hex-encoded random salt
    pub salt: String,
    /// Argon2id cost parameters
    pub params: KeyDerivationParams,
}

impl KdfProfile {
    /// Create a fresh profile with a random salt
    pub fn generate(params: KeyDerivationParams) -> Self {
        Self {
            version: KDF_VERSION,
            salt: generate_salt(),
            params,
        }
    }

    /// Whether this profile should be replaced by one built from `current`
    pub fn needs_upgrade(&self, current: &KeyDerivationParams) -> bool {
        self.params.is_weaker_than(current)
    }

    fn salt_bytes(&self) -> Result<Vec<u8>> {
        let salt = hex::decode(&self.salt)
            .map_err(|e| VaultError::KeyDerivationError(format!("Invalid salt: {}", e)))?;
        if salt.len() < MIN_SALT_LEN {
            return Err(VaultError::KeyDerivationError(format!(
                "Salt too short: {} bytes",
                salt.len()
            )));
        }
        Ok(salt)
    }
}

/// Generate a cryptographically secure random salt (hex-encoded)
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Derive a 256-bit key from a master passphrase
///
/// Deterministic for a given passphrase and profile. Deliberately slow; call
/// it once per session and keep the returned key in the session context.
pub fn derive_key(passphrase: &str, profile: &KdfProfile) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(VaultError::EmptyPassphrase);
    }
    if profile.version != KDF_VERSION {
        return Err(VaultError::KeyDerivationError(format!(
            "Unsupported profile version: {}",
            profile.version
        )));
    }

    let salt = profile.salt_bytes()?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, profile.params.to_argon2()?);

    let mut key_bytes = [0u8; 32];
    argon2
        .hash_password_into(passphrase.as_bytes(), &salt, &mut key_bytes)
        .map_err(|e| VaultError::KeyDerivationError(e.to_string()))?;

    let key = DerivedKey::new(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}
