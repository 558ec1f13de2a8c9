//! Domain models for Tuck

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
}

impl AccountType {
    /// All account types, in declaration order.
    ///
    /// The length of this slice is the smoothing denominator for
    /// account-type likelihoods.
    pub const ALL: [AccountType; 5] = [
        Self::Checking,
        Self::Savings,
        Self::CreditCard,
        Self::Cash,
        Self::Investment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::CreditCard => "credit_card",
            Self::Cash => "cash",
            Self::Investment => "investment",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit_card" | "creditcard" | "credit" => Ok(Self::CreditCard),
            "cash" => Ok(Self::Cash),
            "investment" => Ok(Self::Investment),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Feature tuple for one transaction, shared by training and prediction.
///
/// Immutable once constructed. `label` is the target envelope name during
/// training and is ignored for prediction samples. `amount` is always
/// positive; signs are the ledger's concern, not the classifier's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFeatures {
    /// Free-form merchant/memo text
    pub description: String,
    /// Transaction magnitude, always > 0
    pub amount: f64,
    /// Used to derive day-of-week and month-of-year features
    pub timestamp: NaiveDateTime,
    /// Envelope name this sample belongs to (training only)
    pub label: Option<String>,
    pub account_type: AccountType,
    pub account_name: String,
}

impl TransactionFeatures {
    /// Build a validated feature tuple.
    ///
    /// Returns `Error::InvalidData` for a non-positive or non-finite
    /// amount or an empty description.
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        timestamp: NaiveDateTime,
        label: Option<String>,
        account_type: AccountType,
        account_name: impl Into<String>,
    ) -> Result<Self> {
        let features = Self {
            description: description.into(),
            amount,
            timestamp,
            label,
            account_type,
            account_name: account_name.into(),
        };
        features.validate()?;
        Ok(features)
    }

    /// Check the structural invariants on this sample.
    ///
    /// Deserialized records must be run through this before training.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "transaction amount must be positive, got {}",
                self.amount
            )));
        }
        if self.description.trim().is_empty() {
            return Err(Error::InvalidData(
                "transaction description is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The label, or an error for training samples that lack one.
    pub fn training_label(&self) -> Result<&str> {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => Ok(label),
            _ => Err(Error::Training(format!(
                "training sample \"{}\" has no label",
                self.description
            ))),
        }
    }
}
