//! Cryptographic primitives for secret storage
//!
//! This module provides:
//! - Argon2id key derivation with per-account, versioned profiles
//! - AES-256-GCM authenticated encryption into text envelopes
//! - Secure memory handling with zeroize

mod cipher;
mod key_derivation;
mod secure_memory;

pub use cipher::{decrypt, encrypt, open, seal, Envelope};
pub use key_derivation::{derive_key, generate_salt, KdfProfile, KeyDerivationParams, KDF_VERSION};
pub use secure_memory::{DerivedKey, SecretString};
