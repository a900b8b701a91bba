//! Secret strength scoring
//!
//! The score is additive with caps:
//! - length: 4 points per character, capped at 40
//! - lowercase +10, uppercase +15, digit +15, symbol +20
//! - a character repeated 3+ times in a row: -10
//! - an ascending run of 3 letters or digits (`abc`, `789`, case-insensitive): -10
//!
//! The result is clamped to 0..=100. Only ASCII letters and digits count as
//! letters and digits; every other character counts as a symbol.

use serde::{Deserialize, Serialize};

/// Shortest acceptable secret
pub const MIN_LENGTH: usize = 8;
/// Length below which a longer secret is suggested
pub const RECOMMENDED_LENGTH: usize = 12;
/// Scores below this are weak
pub const WEAK_THRESHOLD: u8 = 40;

const POINTS_PER_CHAR: i32 = 4;
const MAX_LENGTH_POINTS: i32 = 40;
const LOWER_POINTS: i32 = 10;
const UPPER_POINTS: i32 = 15;
const DIGIT_POINTS: i32 = 15;
const SYMBOL_POINTS: i32 = 20;
const REPEAT_PENALTY: i32 = 10;
const SEQUENCE_PENALTY: i32 = 10;

/// Qualitative strength bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLabel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s < WEAK_THRESHOLD => Self::Weak,
            s if s < 60 => Self::Fair,
            s if s < 80 => Self::Good,
            _ => Self::Strong,
        }
    }

    /// Display color for this label
    pub fn color(&self) -> &'static str {
        match self {
            Self::Weak => "red",
            Self::Fair => "yellow",
            Self::Good => "blue",
            Self::Strong => "green",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Strong => "strong",
        }
    }
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score, label and recommendations for one secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthAssessment {
    /// 0..=100
    pub score: u8,
    pub label: StrengthLabel,
    /// Ordered, most important first
    pub recommendations: Vec<String>,
}

impl StrengthAssessment {
    pub fn is_weak(&self) -> bool {
        self.score < WEAK_THRESHOLD
    }
}

/// Score a plaintext secret
pub fn analyze(secret: &str) -> StrengthAssessment {
    let chars: Vec<char> = secret.chars().collect();
    let mut recommendations = Vec::new();
    let mut score: i32 = 0;

    if chars.len() < MIN_LENGTH {
        recommendations.push(format!("Use at least {} characters", MIN_LENGTH));
    } else if chars.len() < RECOMMENDED_LENGTH {
        recommendations.push(format!(
            "Consider using at least {} characters for stronger security",
            RECOMMENDED_LENGTH
        ));
    }
    // min() before multiplying so very long inputs cannot overflow
    let length_chars = chars.len().min((MAX_LENGTH_POINTS / POINTS_PER_CHAR) as usize) as i32;
    score += length_chars * POINTS_PER_CHAR;

    let has_lower = chars.iter().any(|c| c.is_ascii_lowercase());
    let has_upper = chars.iter().any(|c| c.is_ascii_uppercase());
    let has_digit = chars.iter().any(|c| c.is_ascii_digit());
    let has_symbol = chars.iter().any(|c| !c.is_ascii_alphanumeric());

    for (present, points, advice) in [
        (has_lower, LOWER_POINTS, "Add lowercase letters"),
        (has_upper, UPPER_POINTS, "Add uppercase letters"),
        (has_digit, DIGIT_POINTS, "Add numbers"),
        (has_symbol, SYMBOL_POINTS, "Add special characters"),
    ] {
        if present {
            score += points;
        } else {
            recommendations.push(advice.to_string());
        }
    }

    if has_repeated_run(&chars) {
        score -= REPEAT_PENALTY;
        recommendations.push("Avoid repeating characters".to_string());
    }

    if has_ascending_run(&chars) {
        score -= SEQUENCE_PENALTY;
        recommendations.push("Avoid sequential patterns".to_string());
    }

    let score = score.clamp(0, 100) as u8;
    StrengthAssessment {
        score,
        label: StrengthLabel::from_score(score),
        recommendations,
    }
}

/// Same character three or more times in a row. Line terminators never count.
fn has_repeated_run(chars: &[char]) -> bool {
    chars
        .windows(3)
        .any(|w| !is_line_terminator(w[0]) && w[0] == w[1] && w[1] == w[2])
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Three consecutive ascending letters (`a`..`z`) or digits (`0`..`9`)
fn has_ascending_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| {
        let [a, b, c] = [w[0], w[1], w[2]].map(|ch| ch.to_ascii_lowercase());
        let same_class = (a.is_ascii_lowercase() && c.is_ascii_lowercase())
            || (a.is_ascii_digit() && c.is_ascii_digit());
        same_class && (b as u32) == (a as u32) + 1 && (c as u32) == (b as u32) + 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_mixed_secret() {
        let result = analyze("Tr0ub4dor&3xZq!9");
        assert_eq!(result.score, 100);
        assert_eq!(result.label, StrengthLabel::Strong);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_repeated_lowercase_is_weak() {
        let result = analyze("aaaaaaaa");
        // 32 length + 10 lowercase - 10 repeat
        assert_eq!(result.score, 32);
        assert_eq!(result.label, StrengthLabel::Weak);
        assert!(result
            .recommendations
            .contains(&"Avoid repeating characters".to_string()));
    }

    #[test]
    fn test_plain_lowercase_word() {
        // 32 length + 10 lowercase; no repeat or ascending run
        let result = analyze("password");
        assert_eq!(result.score, 42);
        assert_eq!(result.label, StrengthLabel::Fair);
        assert_eq!(
            result.recommendations,
            vec![
                "Consider using at least 12 characters for stronger security",
                "Add uppercase letters",
                "Add numbers",
                "Add special characters",
            ]
        );
    }

    #[test]
    fn test_empty_secret() {
        let result = analyze("");
        assert_eq!(result.score, 0);
        assert_eq!(result.label, StrengthLabel::Weak);
        assert_eq!(result.recommendations.len(), 5);
        assert_eq!(result.recommendations[0], "Use at least 8 characters");
    }

    #[test]
    fn test_length_credit_is_monotonic_and_capped() {
        let mut previous = 0;
        for len in 1..=30 {
            let score = analyze(&"ab".repeat(len)[..len]).score;
            assert!(score >= previous, "score dropped at length {len}");
            previous = score;
        }
        assert!(analyze(&"a".repeat(8)).score <= analyze(&"a".repeat(12)).score);
        assert_eq!(analyze(&"xq".repeat(5)).score, analyze(&"xq".repeat(50)).score);
    }

    #[test]
    fn test_ascending_runs() {
        assert!(has_ascending_run(&['a', 'b', 'c']));
        assert!(has_ascending_run(&['X', 'y', 'Z']));
        assert!(has_ascending_run(&['7', '8', '9']));
        assert!(!has_ascending_run(&['c', 'b', 'a']));
        assert!(!has_ascending_run(&['8', '9', '0']));
        assert!(!has_ascending_run(&['y', 'z', '{']));
        assert!(!has_ascending_run(&['9', ':', ';']));
        assert!(!has_ascending_run(&['a', 'c', 'e']));
    }

    #[test]
    fn test_sequence_penalty_applied() {
        let result = analyze("Qwabc!8Kz");
        assert!(result
            .recommendations
            .contains(&"Avoid sequential patterns".to_string()));
        // 36 length + 60 classes - 10 sequence
        assert_eq!(result.score, 86);
    }

    #[test]
    fn test_both_penalties_stack() {
        // 24 length + 15 digits - 10 - 10
        assert_eq!(analyze("111234").score, 19);
    }

    #[test]
    fn test_repeats_ignore_line_breaks() {
        for c in ['\n', '\r', '\u{2028}', '\u{2029}'] {
            assert!(!has_repeated_run(&[c, c, c]));
        }
        // 28 length + 20 symbol; no repeat penalty
        assert_eq!(analyze("\r\r\r\r\r\r\r").score, 48);
        assert!(has_repeated_run(&['x', '!', '!', '!']));
    }

    #[test]
    fn test_non_ascii_counts_as_symbol() {
        let result = analyze("motdepasseé");
        assert!(!result
            .recommendations
            .contains(&"Add special characters".to_string()));
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(StrengthLabel::from_score(0), StrengthLabel::Weak);
        assert_eq!(StrengthLabel::from_score(39), StrengthLabel::Weak);
        assert_eq!(StrengthLabel::from_score(40), StrengthLabel::Fair);
        assert_eq!(StrengthLabel::from_score(59), StrengthLabel::Fair);
        assert_eq!(StrengthLabel::from_score(60), StrengthLabel::Good);
        assert_eq!(StrengthLabel::from_score(79), StrengthLabel::Good);
        assert_eq!(StrengthLabel::from_score(80), StrengthLabel::Strong);
        assert_eq!(StrengthLabel::from_score(100), StrengthLabel::Strong);

        assert_eq!(StrengthLabel::Weak.color(), "red");
        assert_eq!(StrengthLabel::Strong.to_string(), "strong");
    }
}
