//! Stored secret records
//!
//! A [`SecretRecord`] only ever holds the ciphertext envelope. The plaintext
//! is encrypted the moment a record is created or edited and is discarded
//! right after.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Category assigned when none is given
pub const DEFAULT_CATEGORY: &str = "general";

/// Encrypted secret with its display metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// User-friendly name
    pub name: String,
    pub site: Option<String>,
    /// Login or account name at the site
    pub account_label: Option<String>,
    /// `v1:nonce:tag:ciphertext` envelope
    pub ciphertext: String,
    pub category: String,
    pub tags: BTreeSet<String>,
}

/// Persisted shape of a record. `tags` is a JSON array encoded as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub account_label: Option<String>,
    pub ciphertext: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_tags")]
    pub tags: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_tags() -> String {
    "[]".to_string()
}

impl From<&SecretRecord> for SecretRow {
    fn from(record: &SecretRecord) -> Self {
        let tags: Vec<&String> = record.tags.iter().collect();
        Self {
            id: record.id,
            owner_id: record.owner_id,
            name: record.name.clone(),
            site: record.site.clone(),
            account_label: record.account_label.clone(),
            ciphertext: record.ciphertext.clone(),
            category: record.category.clone(),
            // A list of strings always serializes
            tags: serde_json::to_string(&tags).unwrap_or_else(|_| default_tags()),
        }
    }
}

/// Blank or unparseable tag text reads as no tags; the secret itself stays usable
impl From<SecretRow> for SecretRecord {
    fn from(row: SecretRow) -> Self {
        let tags: BTreeSet<String> = if row.tags.trim().is_empty() {
            BTreeSet::new()
        } else {
            serde_json::from_str(&row.tags).unwrap_or_else(|e| {
                warn!("Ignoring unreadable tags on secret {}: {}", row.id, e);
                BTreeSet::new()
            })
        };
        let category = if row.category.trim().is_empty() {
            default_category()
        } else {
            row.category
        };

        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            site: row.site,
            account_label: row.account_label,
            ciphertext: row.ciphertext,
            category,
            tags,
        }
    }
}

/// Metadata for a secret being saved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSecret {
    pub name: String,
    pub site: Option<String>,
    pub account_label: Option<String>,
    /// `None` falls back to [`DEFAULT_CATEGORY`]
    pub category: Option<String>,
    pub tags: BTreeSet<String>,
}

impl NewSecret {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial edit of an existing record; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct SecretUpdate {
    pub name: Option<String>,
    pub site: Option<Option<String>>,
    pub account_label: Option<Option<String>>,
    pub category: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    /// New plaintext; re-encrypted under the session key
    pub secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SecretRecord {
        SecretRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Mail".to_string(),
            site: Some("mail.example.com".to_string()),
            account_label: Some("alice".to_string()),
            ciphertext: "v1:00:00:00".to_string(),
            category: "work".to_string(),
            tags: ["email", "important"].iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_row_encodes_tags_as_json_text() {
        let record = sample();
        let row = SecretRow::from(&record);
        assert_eq!(row.tags, r#"["email","important"]"#);

        assert_eq!(SecretRecord::from(row), record);
    }

    #[test]
    fn test_row_defaults_when_fields_missing() {
        let json = format!(
            r#"{{"id":"{}","ownerId":"{}","name":"Bank","ciphertext":"v1:00:00:00"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let row: SecretRow = serde_json::from_str(&json).unwrap();
        assert_eq!(row.category, DEFAULT_CATEGORY);
        assert_eq!(row.tags, "[]");

        let record = SecretRecord::from(row);
        assert!(record.tags.is_empty());
        assert!(record.site.is_none());
    }

    #[test]
    fn test_blank_tags_and_category_tolerated() {
        let mut row = SecretRow::from(&sample());
        row.tags = String::new();
        row.category = " ".to_string();

        let record = SecretRecord::from(row);
        assert!(record.tags.is_empty());
        assert_eq!(record.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_unparseable_tags_read_as_empty() {
        let mut row = SecretRow::from(&sample());
        row.tags = "not json".to_string();

        let record = SecretRecord::from(row);
        assert!(record.tags.is_empty());
        assert_eq!(record.name, "Mail");
        assert_eq!(record.category, "work");
    }
}
