//! AES-256-GCM authenticated encryption of individual secrets
//!
//! Envelope format: `v1:{nonce_hex}:{auth_tag_hex}:{ciphertext_hex}`
//! - Nonce: 12 bytes (96 bits), fresh from the OS RNG on every call
//! - Auth tag: 16 bytes (128 bits)
//! - Ciphertext: same length as the UTF-8 plaintext

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::DerivedKey;
use crate::error::{Result, VaultError};

const ENVELOPE_VERSION: &str = "v1";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Self-contained ciphertext: everything needed to decrypt except the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LEN],
    pub auth_tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            ENVELOPE_VERSION,
            hex::encode(self.nonce),
            hex::encode(self.auth_tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl FromStr for Envelope {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 4 {
            return Err(VaultError::EncodingError(
                "expected v1:nonce:tag:ciphertext".to_string(),
            ));
        }
        if parts[0] != ENVELOPE_VERSION {
            return Err(VaultError::EncodingError(format!(
                "unsupported envelope version: {}",
                parts[0]
            )));
        }

        let nonce = decode_fixed::<NONCE_LEN>(parts[1], "nonce")?;
        let auth_tag = decode_fixed::<TAG_LEN>(parts[2], "auth tag")?;
        let ciphertext = hex::decode(parts[3])
            .map_err(|e| VaultError::EncodingError(format!("invalid ciphertext hex: {}", e)))?;

        Ok(Self {
            nonce,
            auth_tag,
            ciphertext,
        })
    }
}

fn decode_fixed<const N: usize>(field: &str, name: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(field)
        .map_err(|e| VaultError::EncodingError(format!("invalid {} hex: {}", name, e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        VaultError::EncodingError(format!(
            "invalid {} length: expected {}, got {}",
            name,
            N,
            bytes.len()
        ))
    })
}

/// Encrypt raw bytes under `key` with a fresh random nonce
pub fn seal(plaintext: &[u8], key: &DerivedKey) -> Result<Envelope> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    // aes-gcm appends the auth tag to the ciphertext
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    if sealed.len() < TAG_LEN {
        return Err(VaultError::EncryptionError("Ciphertext too short".to_string()));
    }

    let tag = sealed.split_off(sealed.len() - TAG_LEN);
    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&tag);

    Ok(Envelope {
        nonce,
        auth_tag,
        ciphertext: sealed,
    })
}

/// Decrypt and authenticate an envelope
///
/// A wrong key or any tampering fails with [`VaultError::DecryptionError`].
pub fn open(envelope: &Envelope, key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::DecryptionError(e.to_string()))?;

    let mut sealed = Vec::with_capacity(envelope.ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(&envelope.ciphertext);
    sealed.extend_from_slice(&envelope.auth_tag);

    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), sealed.as_slice())
        .map_err(|_| {
            VaultError::DecryptionError("wrong key or corrupted envelope".to_string())
        })
}

/// Encrypt a secret and return its envelope string
pub fn encrypt(plaintext: &str, key: &DerivedKey) -> Result<String> {
    Ok(seal(plaintext.as_bytes(), key)?.to_string())
}

/// Parse an envelope string and decrypt it back to the original secret
pub fn decrypt(envelope: &str, key: &DerivedKey) -> Result<String> {
    let envelope: Envelope = envelope.parse()?;
    let plaintext = open(&envelope, key)?;
    String::from_utf8(plaintext)
        .map_err(|e| VaultError::DecryptionError(format!("Invalid UTF-8: {}", e)))
}
