//! Secret vault orchestration
//!
//! Ties accounts, sessions, storage and the crypto engine together. Every
//! operation that touches a plaintext takes the caller's [`VaultSession`];
//! the vault itself never holds a key.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::account::Account;
use crate::crypto::{decrypt, encrypt, KeyDerivationParams, SecretString};
use crate::error::{Result, VaultError};
use crate::health::{aggregate_blocking, VaultHealth};
use crate::record::{NewSecret, SecretRecord, SecretRow, SecretUpdate, DEFAULT_CATEGORY};
use crate::session::VaultSession;
use crate::storage::VaultStorage;

/// Storage key prefix for accounts
const ACCOUNT_PREFIX: &str = "account:";
/// Storage key prefix for secrets; followed by `{owner_id}:{id}`
const SECRET_PREFIX: &str = "secret:";

pub struct SecretVault {
    storage: Arc<dyn VaultStorage>,
    /// Parameters for new and re-keyed accounts
    kdf_params: KeyDerivationParams,
    /// Session lifetime in minutes, 0 = sessions never expire
    auto_lock_minutes: u32,
}

impl SecretVault {
    pub fn new(storage: Arc<dyn VaultStorage>, kdf_params: KeyDerivationParams) -> Self {
        debug!("Secret vault using {}", storage.backend_name());
        Self {
            storage,
            kdf_params,
            auto_lock_minutes: 0,
        }
    }

    /// Reject sessions older than `minutes` (0 disables expiry)
    pub fn with_auto_lock(mut self, minutes: u32) -> Self {
        self.auto_lock_minutes = minutes;
        self
    }

    /// Register a new account and return an open session for it
    pub async fn create_account(&self, username: &str, passphrase: &str) -> Result<VaultSession> {
        if self.find_account(username).await?.is_some() {
            return Err(VaultError::AccountExists(username.trim().to_string()));
        }

        let (account, key) = Account::create(username, passphrase, self.kdf_params)?;
        self.save_account(&account).await?;

        info!("Created account: {}", account.username);
        Ok(VaultSession::with_key(&account, key))
    }

    /// Look up an account by username
    pub async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        let username = username.trim();
        for key in self.storage.list_keys(ACCOUNT_PREFIX).await? {
            if let Some(data) = self.storage.retrieve(&key).await? {
                let account: Account = serde_json::from_slice(&data)?;
                if account.username == username {
                    return Ok(Some(account));
                }
            }
        }
        Ok(None)
    }

    /// Unlock an account with its master passphrase
    pub async fn unlock(&self, username: &str, passphrase: &str) -> Result<VaultSession> {
        let account = self
            .find_account(username)
            .await?
            .ok_or_else(|| VaultError::AccountNotFound(username.trim().to_string()))?;

        let session = VaultSession::open(&account, passphrase)?;
        if account.kdf.needs_upgrade(&self.kdf_params) {
            warn!(
                "Account {} uses outdated key derivation parameters; change the passphrase to upgrade",
                account.username
            );
        }

        info!("Unlocked account: {}", account.username);
        Ok(session)
    }

    /// Whether the session's account was derived with weaker parameters than configured
    pub async fn needs_kdf_upgrade(&self, session: &VaultSession) -> Result<bool> {
        self.ensure_active(session)?;
        let account = self.load_account(session.account_id()).await?;
        Ok(account.kdf.needs_upgrade(&self.kdf_params))
    }

    /// Encrypt and save a new secret
    pub async fn add_secret(
        &self,
        session: &VaultSession,
        meta: NewSecret,
        secret: &str,
    ) -> Result<SecretRecord> {
        self.ensure_active(session)?;
        let name = meta.name.trim();
        if name.is_empty() {
            return Err(VaultError::InvalidInput("secret name must not be empty".to_string()));
        }

        let record = SecretRecord {
            id: Uuid::new_v4(),
            owner_id: session.account_id(),
            name: name.to_string(),
            site: non_blank(meta.site),
            account_label: non_blank(meta.account_label),
            ciphertext: encrypt(secret, session.key())?,
            category: normalize_category(meta.category),
            tags: normalize_tags(meta.tags),
        };

        self.save_record(&record).await?;

        info!("Added secret: {} ({})", record.name, record.id);
        Ok(record)
    }

    /// All readable secrets owned by the session's account, sorted by name
    ///
    /// Rows that cannot be parsed are skipped with a warning; [`health`]
    /// reports them.
    ///
    /// [`health`]: SecretVault::health
    pub async fn list(&self, session: &VaultSession) -> Result<Vec<SecretRecord>> {
        self.ensure_active(session)?;
        let (records, _) = self.load_records(session.account_id()).await?;
        Ok(records)
    }

    /// Secrets matching a case-insensitive `term` in name, site or account
    /// label, optionally limited to one category
    pub async fn search(
        &self,
        session: &VaultSession,
        term: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<SecretRecord>> {
        let term = term.map(str::to_lowercase).unwrap_or_default();
        let hit = |field: &str| field.to_lowercase().contains(&term);

        let records = self.list(session).await?;
        Ok(records
            .into_iter()
            .filter(|r| category.map_or(true, |c| r.category == c))
            .filter(|r| {
                hit(&r.name)
                    || r.site.as_deref().is_some_and(hit)
                    || r.account_label.as_deref().is_some_and(hit)
            })
            .collect())
    }

    /// Distinct categories in use, sorted
    pub async fn categories(&self, session: &VaultSession) -> Result<Vec<String>> {
        let categories: BTreeSet<String> = self
            .list(session)
            .await?
            .into_iter()
            .map(|r| r.category)
            .collect();
        Ok(categories.into_iter().collect())
    }

    /// Fetch one record (metadata and envelope, no plaintext)
    pub async fn get(&self, session: &VaultSession, id: Uuid) -> Result<SecretRecord> {
        self.ensure_active(session)?;
        let data = self
            .storage
            .retrieve(&record_key(session.account_id(), id))
            .await?
            .ok_or_else(|| VaultError::RecordNotFound(id.to_string()))?;

        let row: SecretRow = serde_json::from_slice(&data)?;
        Ok(SecretRecord::from(row))
    }

    /// Decrypt one secret for display or copying
    ///
    /// Decryption failures are returned to the caller as-is.
    pub async fn reveal(&self, session: &VaultSession, id: Uuid) -> Result<SecretString> {
        let record = self.get(session, id).await?;
        let plaintext = decrypt(&record.ciphertext, session.key())?;

        debug!("Revealed secret: {}", id);
        Ok(SecretString::new(plaintext))
    }

    /// Edit metadata and/or replace the secret itself
    pub async fn update(
        &self,
        session: &VaultSession,
        id: Uuid,
        update: SecretUpdate,
    ) -> Result<SecretRecord> {
        let mut record = self.get(session, id).await?;

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(VaultError::InvalidInput("secret name must not be empty".to_string()));
            }
            record.name = name.to_string();
        }
        if let Some(site) = update.site {
            record.site = non_blank(site);
        }
        if let Some(account_label) = update.account_label {
            record.account_label = non_blank(account_label);
        }
        if let Some(category) = update.category {
            record.category = normalize_category(Some(category));
        }
        if let Some(tags) = update.tags {
            record.tags = normalize_tags(tags);
        }
        if let Some(mut secret) = update.secret {
            record.ciphertext = encrypt(&secret, session.key())?;
            secret.zeroize();
        }

        self.save_record(&record).await?;

        info!("Updated secret: {}", id);
        Ok(record)
    }

    /// Delete a secret
    pub async fn delete(&self, session: &VaultSession, id: Uuid) -> Result<()> {
        self.ensure_active(session)?;
        if !self
            .storage
            .delete(&record_key(session.account_id(), id))
            .await?
        {
            return Err(VaultError::RecordNotFound(id.to_string()));
        }

        info!("Deleted secret: {}", id);
        Ok(())
    }

    /// Weak/reused statistics over every secret of the session's account
    ///
    /// Rows that cannot be parsed count toward `total` and are listed in
    /// `unreadable` next to envelopes that fail to decrypt.
    pub async fn health(&self, session: &VaultSession) -> Result<VaultHealth> {
        self.ensure_active(session)?;
        let (records, broken) = self.load_records(session.account_id()).await?;

        let mut health = aggregate_blocking(records, session.key().clone()).await?;
        health.total += broken.len();
        health.unreadable.extend(broken);
        Ok(health)
    }

    /// Change the master passphrase and re-encrypt every secret
    ///
    /// The new key uses a fresh salt and the configured parameters. Fails
    /// without writing anything if any secret cannot be read or decrypted
    /// with the current key. The re-encrypted secrets and the new account
    /// profile are committed in a single storage batch.
    pub async fn change_passphrase(
        &self,
        session: &mut VaultSession,
        current: &str,
        new_passphrase: &str,
    ) -> Result<()> {
        self.ensure_active(session)?;
        let mut account = self.load_account(session.account_id()).await?;
        let old_key = account.derive_verified_key(current)?;

        let (records, broken) = self.load_records(account.id).await?;
        if let Some(id) = broken.first() {
            return Err(VaultError::StorageError(format!(
                "Cannot re-encrypt unreadable secret {}",
                id
            )));
        }

        let mut plaintexts = Vec::with_capacity(records.len());
        for record in &records {
            let plaintext = decrypt(&record.ciphertext, &old_key).map_err(|e| {
                warn!("Cannot re-encrypt secret {}: {}", record.id, e);
                e
            })?;
            plaintexts.push(SecretString::new(plaintext));
        }

        let new_key = account.rekey(new_passphrase, self.kdf_params)?;

        let mut batch = Vec::with_capacity(records.len() + 1);
        for (mut record, plaintext) in records.into_iter().zip(&plaintexts) {
            record.ciphertext = encrypt(plaintext.expose(), &new_key)?;
            batch.push((
                record_key(record.owner_id, record.id),
                serde_json::to_vec(&SecretRow::from(&record))?,
            ));
        }
        let reencrypted = batch.len();
        batch.push((account_key(account.id), serde_json::to_vec(&account)?));

        self.storage.store_many(&batch).await?;
        session.replace_key(new_key);

        info!(
            "Changed passphrase for {} ({} secrets re-encrypted)",
            account.username, reencrypted
        );
        Ok(())
    }

    fn ensure_active(&self, session: &VaultSession) -> Result<()> {
        if session.is_expired(self.auto_lock_minutes) {
            warn!("Session for {} has expired", session.username());
            return Err(VaultError::SessionExpired);
        }
        Ok(())
    }

    /// Parsed records sorted by name, plus ids of rows that failed to parse
    async fn load_records(&self, owner_id: Uuid) -> Result<(Vec<SecretRecord>, Vec<Uuid>)> {
        let mut records = Vec::new();
        let mut broken = Vec::new();

        for key in self.storage.list_keys(&owner_prefix(owner_id)).await? {
            let Some(data) = self.storage.retrieve(&key).await? else {
                continue;
            };
            match serde_json::from_slice::<SecretRow>(&data) {
                Ok(row) => records.push(SecretRecord::from(row)),
                Err(e) => {
                    warn!("Skipping unreadable row {}: {}", key, e);
                    match key.rsplit(':').next().and_then(|id| Uuid::parse_str(id).ok()) {
                        Some(id) => broken.push(id),
                        None => warn!("Row key {} carries no record id", key),
                    }
                }
            }
        }

        records.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok((records, broken))
    }

    async fn load_account(&self, id: Uuid) -> Result<Account> {
        let data = self
            .storage
            .retrieve(&account_key(id))
            .await?
            .ok_or_else(|| VaultError::AccountNotFound(id.to_string()))?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        let data = serde_json::to_vec(account)?;
        self.storage.store(&account_key(account.id), &data).await
    }

    async fn save_record(&self, record: &SecretRecord) -> Result<()> {
        let data = serde_json::to_vec(&SecretRow::from(record))?;
        self.storage
            .store(&record_key(record.owner_id, record.id), &data)
            .await
    }
}

fn account_key(id: Uuid) -> String {
    format!("{}{}", ACCOUNT_PREFIX, id)
}

fn owner_prefix(owner_id: Uuid) -> String {
    format!("{}{}:", SECRET_PREFIX, owner_id)
}

fn record_key(owner_id: Uuid, id: Uuid) -> String {
    format!("{}{}", owner_prefix(owner_id), id)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_category(category: Option<String>) -> String {
    non_blank(category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn normalize_tags(tags: BTreeSet<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
