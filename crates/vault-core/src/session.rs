//! Unlocked vault sessions
//!
//! A [`VaultSession`] is the only place a derived key lives. It is created by
//! unlocking an account, passed explicitly to every operation that needs the
//! key, and wipes the key when locked or dropped.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::account::Account;
use crate::crypto::DerivedKey;
use crate::error::Result;

#[derive(Debug)]
pub struct VaultSession {
    account_id: Uuid,
    username: String,
    key: DerivedKey,
    opened_at: DateTime<Utc>,
}

impl VaultSession {
    /// Unlock `account` with its master passphrase
    pub fn open(account: &Account, passphrase: &str) -> Result<Self> {
        let key = account.derive_verified_key(passphrase)?;
        Ok(Self::with_key(account, key))
    }

    /// Wrap a key that was already derived and verified for `account`
    pub fn with_key(account: &Account, key: DerivedKey) -> Self {
        debug!("Opened session for account {}", account.id);
        Self {
            account_id: account.id,
            username: account.username.clone(),
            key,
            opened_at: Utc::now(),
        }
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn key(&self) -> &DerivedKey {
        &self.key
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Whether the session has been open longer than `timeout_minutes` (0 = never)
    pub fn is_expired(&self, timeout_minutes: u32) -> bool {
        timeout_minutes > 0
            && Utc::now() - self.opened_at > Duration::minutes(i64::from(timeout_minutes))
    }

    /// Swap in a new key after a passphrase change
    pub(crate) fn replace_key(&mut self, key: DerivedKey) {
        self.key = key;
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, minutes: i64) {
        self.opened_at -= Duration::minutes(minutes);
    }

    /// End the session; the key is zeroized on drop
    pub fn lock(self) {
        debug!("Locked session for account {}", self.account_id);
    }
}
