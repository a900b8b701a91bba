//! Random secret generation
//!
//! Characters are drawn independently and uniformly from the enabled
//! character classes using the operating system's CSPRNG.

use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Default generated secret length
pub const DEFAULT_LENGTH: usize = 16;

/// Which character classes a generated secret may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterClasses {
    pub include_upper: bool,
    pub include_lower: bool,
    pub include_digits: bool,
    pub include_symbols: bool,
}

impl Default for CharacterClasses {
    fn default() -> Self {
        Self {
            include_upper: true,
            include_lower: true,
            include_digits: true,
            include_symbols: true,
        }
    }
}

impl CharacterClasses {
    /// Concatenate the enabled sets: upper, lower, digits, symbols
    pub fn alphabet(&self) -> String {
        [
            (self.include_upper, UPPERCASE),
            (self.include_lower, LOWERCASE),
            (self.include_digits, DIGITS),
            (self.include_symbols, SYMBOLS),
        ]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, set)| *set)
        .collect()
    }
}

/// Generate a random secret of exactly `length` characters
pub fn generate(length: usize, classes: &CharacterClasses) -> Result<String> {
    if length == 0 {
        return Err(VaultError::InvalidConfiguration(
            "secret length must be at least 1".to_string(),
        ));
    }

    let alphabet: Vec<char> = classes.alphabet().chars().collect();
    if alphabet.is_empty() {
        return Err(VaultError::InvalidConfiguration(
            "at least one character class must be enabled".to_string(),
        ));
    }

    let mut rng = OsRng;
    Ok((0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect())
}
