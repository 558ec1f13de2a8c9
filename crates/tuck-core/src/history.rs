//! Transaction history loading
//!
//! The classifier core never talks to storage; training data arrives as
//! in-memory samples. This module is the file-based provider the CLI
//! uses: a JSON array of labeled transaction records.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::TransactionFeatures;

/// Load and validate a history file.
///
/// The file is a JSON array of `TransactionFeatures` records:
///
/// ```json
/// [
///   {
///     "description": "NETFLIX.COM",
///     "amount": 15.99,
///     "timestamp": "2024-01-03T00:00:00",
///     "label": "Streaming",
///     "account_type": "credit_card",
///     "account_name": "Rewards Card"
///   }
/// ]
/// ```
///
/// Every record must pass the structural invariants (positive amount,
/// non-empty description); the first invalid record fails the whole load.
pub fn load_history(path: &Path) -> Result<Vec<TransactionFeatures>> {
    let contents = std::fs::read_to_string(path)?;
    let samples: Vec<TransactionFeatures> = serde_json::from_str(&contents)?;
    for tx in &samples {
        tx.validate()?;
    }
    info!(count = samples.len(), path = %path.display(), "Loaded transaction history");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_history(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_history() {
        let file = write_history(
            r#"[
                {
                    "description": "NETFLIX.COM",
                    "amount": 15.99,
                    "timestamp": "2024-01-03T00:00:00",
                    "label": "Streaming",
                    "account_type": "credit_card",
                    "account_name": "Rewards Card"
                },
                {
                    "description": "SAFEWAY 1182",
                    "amount": 61.30,
                    "timestamp": "2024-02-05T12:30:00",
                    "label": null,
                    "account_type": "checking",
                    "account_name": "Everyday"
                }
            ]"#,
        );

        let samples = load_history(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label.as_deref(), Some("Streaming"));
        assert!(samples[1].label.is_none());
    }

    #[test]
    fn test_load_rejects_invalid_amount() {
        let file = write_history(
            r#"[
                {
                    "description": "REFUND",
                    "amount": -10.0,
                    "timestamp": "2024-01-03T00:00:00",
                    "label": "Misc",
                    "account_type": "checking",
                    "account_name": "Everyday"
                }
            ]"#,
        );
        assert!(load_history(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let file = write_history("not json");
        assert!(load_history(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_history(Path::new("/nonexistent/history.json")).is_err());
    }
}
