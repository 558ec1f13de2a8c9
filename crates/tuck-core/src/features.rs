//! Feature extraction
//!
//! Turns raw transaction text and timestamps into the discrete features
//! the classifier consumes:
//! - Description tokens (lowercased, alphanumeric only)
//! - Day-of-week bucket (0 = Monday .. 6 = Sunday)
//! - Month bucket (0 = January .. 11 = December)

use chrono::{Datelike, NaiveDateTime};

/// Number of day-of-week buckets
pub const DAY_BUCKETS: usize = 7;

/// Number of month buckets
pub const MONTH_BUCKETS: usize = 12;

/// Tokenize a transaction description.
///
/// Lowercases, strips everything outside `[a-z0-9\s]`, and splits on
/// whitespace runs. Pure and deterministic. Empty or punctuation-only
/// input yields an empty vec; callers must tolerate that.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Day-of-week bucket for a timestamp (0 = Monday .. 6 = Sunday)
pub fn day_bucket(timestamp: NaiveDateTime) -> usize {
    timestamp.weekday().num_days_from_monday() as usize
}

/// Month bucket for a timestamp (0 = January .. 11 = December)
pub fn month_bucket(timestamp: NaiveDateTime) -> usize {
    timestamp.month0() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_tokenize_strips_punctuation() {
        // Punctuation is deleted, not turned into a separator
        assert_eq!(tokenize("NETFLIX.COM"), vec!["netflixcom"]);
        assert_eq!(tokenize("NETFLIX.COM*12345"), vec!["netflixcom12345"]);
        assert_eq!(tokenize("Trader Joe's #071"), vec!["trader", "joes", "071"]);
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  FRED   MEYER  "), vec!["fred", "meyer"]);
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("***").is_empty());
    }

    #[test]
    fn test_buckets() {
        // 2024-01-01 was a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(day_bucket(monday), 0);
        assert_eq!(month_bucket(monday), 0);

        let sunday = NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(day_bucket(sunday), 6);
        assert_eq!(month_bucket(sunday), 11);
    }
}
