//! Classifier ensemble
//!
//! Blends three views of the same transaction history:
//! - A general model trained on everything
//! - Per-account-type models (any type with at least one sample)
//! - Per-account models (only accounts with enough history)
//!
//! Account-sliced models pick up habits the general model dilutes: the
//! same merchant can mean groceries on a checking account and business
//! expenses on a card. Accounts with thin history fall back to the
//! general model rather than training a noisy specialized one.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::bayes::NaiveBayesClassifier;
use crate::error::Result;
use crate::models::{AccountType, TransactionFeatures};

/// Blend weights for the three model tiers; sum to 1.0
pub const GENERAL_WEIGHT: f64 = 0.4;
pub const ACCOUNT_TYPE_WEIGHT: f64 = 0.3;
pub const ACCOUNT_NAME_WEIGHT: f64 = 0.3;

/// Minimum history an account needs before it gets its own model
pub const MIN_ACCOUNT_SAMPLES: usize = 50;

/// Labels at or below this blended probability are dropped from results
pub const MIN_PROBABILITY: f64 = 0.05;

/// One general model plus account-type and account-name specializations.
///
/// Owns all model state explicitly; `retrain` rebuilds everything
/// wholesale, so callers that need concurrent reads can train a fresh
/// ensemble and swap it in behind an `RwLock` or `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ClassifierEnsemble {
    general: NaiveBayesClassifier,
    by_account_type: HashMap<AccountType, NaiveBayesClassifier>,
    by_account_name: HashMap<String, NaiveBayesClassifier>,
}

impl ClassifierEnsemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Train the general model and every applicable specialized model.
    ///
    /// Specialized maps are cleared and rebuilt on each call. An empty
    /// sample set is logged and ignored, keeping the existing models.
    pub fn train_all(&mut self, samples: &[TransactionFeatures]) -> Result<()> {
        if samples.is_empty() {
            warn!("No transactions available for ensemble training; keeping existing models");
            return Ok(());
        }

        self.general.train(samples)?;
        self.by_account_type.clear();
        self.by_account_name.clear();

        for account_type in AccountType::ALL {
            let slice: Vec<TransactionFeatures> = samples
                .iter()
                .filter(|tx| tx.account_type == account_type)
                .cloned()
                .collect();
            if slice.is_empty() {
                continue;
            }
            let mut model = NaiveBayesClassifier::new();
            model.train(&slice)?;
            self.by_account_type.insert(account_type, model);
        }

        let account_names: HashSet<&str> =
            samples.iter().map(|tx| tx.account_name.as_str()).collect();
        for name in account_names {
            let slice: Vec<TransactionFeatures> = samples
                .iter()
                .filter(|tx| tx.account_name == name)
                .cloned()
                .collect();
            if slice.len() < MIN_ACCOUNT_SAMPLES {
                continue;
            }
            let mut model = NaiveBayesClassifier::new();
            model.train(&slice)?;
            self.by_account_name.insert(name.to_string(), model);
        }

        info!(
            samples = samples.len(),
            account_type_models = self.by_account_type.len(),
            account_models = self.by_account_name.len(),
            "Trained classifier ensemble"
        );
        Ok(())
    }

    /// Drop all specialized models and train everything again.
    ///
    /// Idempotent; safe to call on a schedule.
    pub fn retrain(&mut self, samples: &[TransactionFeatures]) -> Result<()> {
        self.by_account_type.clear();
        self.by_account_name.clear();
        self.train_all(samples)
    }

    /// Whether a dedicated model exists for this account type.
    pub fn has_account_type_model(&self, account_type: AccountType) -> bool {
        self.by_account_type.contains_key(&account_type)
    }

    /// Whether a dedicated model exists for this account.
    pub fn has_account_model(&self, account_name: &str) -> bool {
        self.by_account_name.contains_key(account_name)
    }

    /// Blended envelope distribution for one transaction.
    ///
    /// Queries the general model and both specializations (each falling
    /// back to the general model when absent), blends per label over the
    /// union, renormalizes, and drops labels at or below
    /// [`MIN_PROBABILITY`]. All-zero blends return an empty map.
    pub fn predict(&self, tx: &TransactionFeatures) -> HashMap<String, f64> {
        let general = self.general.predict(tx);
        let by_type = self
            .by_account_type
            .get(&tx.account_type)
            .map(|model| model.predict(tx));
        let by_name = self
            .by_account_name
            .get(&tx.account_name)
            .map(|model| model.predict(tx));

        let type_dist = by_type.as_ref().unwrap_or(&general);
        let name_dist = by_name.as_ref().unwrap_or(&general);

        let mut labels: HashSet<&str> = HashSet::new();
        labels.extend(general.keys().map(String::as_str));
        labels.extend(type_dist.keys().map(String::as_str));
        labels.extend(name_dist.keys().map(String::as_str));

        let mut blended: HashMap<String, f64> = HashMap::with_capacity(labels.len());
        for label in labels {
            let score = GENERAL_WEIGHT * general.get(label).copied().unwrap_or(0.0)
                + ACCOUNT_TYPE_WEIGHT * type_dist.get(label).copied().unwrap_or(0.0)
                + ACCOUNT_NAME_WEIGHT * name_dist.get(label).copied().unwrap_or(0.0);
            blended.insert(label.to_string(), score);
        }

        let total: f64 = blended.values().sum();
        if !total.is_finite() || total <= 0.0 {
            return HashMap::new();
        }

        blended
            .into_iter()
            .map(|(label, score)| (label, score / total))
            .filter(|(_, prob)| *prob > MIN_PROBABILITY)
            .collect()
    }
}

/// Suggest envelopes for an account from its recent activity.
///
/// Scores each envelope the account used strictly after `since` by
/// 0.5 x share-of-transaction-count + 0.5 x share-of-spend.
/// Unlabeled samples are skipped.
pub fn suggest_envelopes(
    samples: &[TransactionFeatures],
    account_name: &str,
    since: NaiveDateTime,
) -> HashMap<String, f64> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut amounts: HashMap<&str, f64> = HashMap::new();
    let mut total_count = 0usize;
    let mut total_amount = 0.0f64;

    for tx in samples {
        if tx.account_name != account_name || tx.timestamp <= since {
            continue;
        }
        let Some(label) = tx.label.as_deref() else {
            continue;
        };
        *counts.entry(label).or_default() += 1;
        *amounts.entry(label).or_default() += tx.amount;
        total_count += 1;
        total_amount += tx.amount;
    }

    if total_count == 0 || total_amount <= 0.0 {
        return HashMap::new();
    }

    counts
        .into_iter()
        .map(|(label, count)| {
            let frequency_share = count as f64 / total_count as f64;
            let amount_share = amounts[label] / total_amount;
            (
                label.to_string(),
                0.5 * frequency_share + 0.5 * amount_share,
            )
        })
        .collect()
}
