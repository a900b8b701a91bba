//! Human-readable rendering of vault results

use vault_core::{SecretRecord, StrengthAssessment, VaultHealth};

/// One line per record: id, name, site, account, category, tags
pub fn record_line(record: &SecretRecord) -> String {
    let mut line = format!("{}  {}", record.id, record.name);
    if let Some(site) = &record.site {
        line.push_str(&format!("  <{}>", site));
    }
    if let Some(account) = &record.account_label {
        line.push_str(&format!("  as {}", account));
    }
    line.push_str(&format!("  [{}]", record.category));
    if !record.tags.is_empty() {
        let tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
        line.push_str(&format!("  #{}", tags.join(" #")));
    }
    line
}

pub fn assessment(result: &StrengthAssessment) -> String {
    let mut out = format!(
        "Strength: {}/100 ({}, {})",
        result.score,
        result.label,
        result.label.color()
    );
    for recommendation in &result.recommendations {
        out.push_str(&format!("\n  - {}", recommendation));
    }
    out
}

pub fn health(health: &VaultHealth) -> String {
    let mut out = format!(
        "Overall score: {}%\nTotal secrets: {}\nWeak: {}\nReused: {}",
        health.overall_score, health.total, health.weak_count, health.reused_count
    );
    if !health.unreadable.is_empty() {
        out.push_str(&format!("\nUnreadable: {}", health.unreadable.len()));
        for id in &health.unreadable {
            out.push_str(&format!("\n  - {}", id));
        }
    }
    if health.weak_count > 0 {
        out.push_str(&format!(
            "\n{} secrets are weak and should be updated",
            health.weak_count
        ));
    }
    if health.reused_count > 0 {
        out.push_str(&format!(
            "\n{} secrets are reused across multiple accounts",
            health.reused_count
        ));
    }
    out
}
