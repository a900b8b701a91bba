//! Vault-wide health statistics
//!
//! Decrypts every record with the session key, scores each plaintext and
//! counts weak and reused secrets. A record that fails to decrypt is listed
//! in [`VaultHealth::unreadable`] and counted in `total`, but it takes no part
//! in the weak count, the reuse count or the average score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::crypto::{decrypt, DerivedKey};
use crate::error::{Result, VaultError};
use crate::record::SecretRecord;
use crate::strength::analyze;

/// Aggregate health of one owner's vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultHealth {
    /// Rounded mean score of every readable record, 0 when there are none
    pub overall_score: u8,
    pub weak_count: usize,
    /// Each repeat of an already-seen secret counts once
    pub reused_count: usize,
    /// All records, readable or not
    pub total: usize,
    /// Records whose envelope could not be decrypted
    pub unreadable: Vec<Uuid>,
}

impl VaultHealth {
    /// Number of records that were actually scored
    pub fn scored(&self) -> usize {
        self.total - self.unreadable.len()
    }
}

/// Decrypt and score every record
pub fn aggregate(records: &[SecretRecord], key: &DerivedKey) -> VaultHealth {
    let mut health = VaultHealth {
        total: records.len(),
        ..Default::default()
    };
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut score_sum: u64 = 0;

    for record in records {
        let plaintext = match decrypt(&record.ciphertext, key) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!("Skipping unreadable secret {}: {}", record.id, e);
                health.unreadable.push(record.id);
                continue;
            }
        };

        let assessment = analyze(&plaintext);
        score_sum += u64::from(assessment.score);
        if assessment.is_weak() {
            health.weak_count += 1;
        }

        if seen.contains(&plaintext) {
            health.reused_count += 1;
            let mut plaintext = plaintext;
            plaintext.zeroize();
        } else {
            seen.insert(plaintext);
        }
    }

    for mut plaintext in seen.drain() {
        plaintext.zeroize();
    }

    let scored = health.scored() as u64;
    if scored > 0 {
        // Round half up
        health.overall_score = ((score_sum * 2 + scored) / (scored * 2)) as u8;
    }

    debug!(
        "Vault health: {} total, {} weak, {} reused, {} unreadable",
        health.total,
        health.weak_count,
        health.reused_count,
        health.unreadable.len()
    );
    health
}

/// Run [`aggregate`] on the blocking thread pool
///
/// Decrypting and scoring a large vault is CPU work; this keeps it off the
/// async executor threads.
pub async fn aggregate_blocking(records: Vec<SecretRecord>, key: DerivedKey) -> Result<VaultHealth> {
    tokio::task::spawn_blocking(move || aggregate(&records, &key))
        .await
        .map_err(|e| VaultError::TaskFailed(e.to_string()))
}
