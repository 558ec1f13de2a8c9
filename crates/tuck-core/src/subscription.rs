//! Binary subscription classifier
//!
//! Online variant of the Naive Bayes model that distinguishes recurring
//! subscription charges from one-off spending. Two parallel sets of
//! per-class tables are kept as raw counts and updated one labeled sample
//! at a time; likelihoods are computed on demand, so there is no full
//! rebuild when a new sample arrives.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::bayes::{
    ACCOUNT_NAME_WEIGHT, ACCOUNT_TYPE_WEIGHT, ALPHA, AMOUNT_WEIGHT, TIME_WEIGHT, WORD_WEIGHT,
};
use crate::error::Result;
use crate::features::{day_bucket, month_bucket, tokenize, DAY_BUCKETS, MONTH_BUCKETS};
use crate::models::{AccountType, TransactionFeatures};
use crate::stats::RunningGaussian;

/// Training label marking a recurring subscription charge
pub const SUBSCRIPTION_LABEL: &str = "SUBSCRIPTION";

/// Training label marking a one-off transaction
pub const NON_SUBSCRIPTION_LABEL: &str = "NON_SUBSCRIPTION";

/// Accumulated feature counts for one of the two classes.
#[derive(Debug, Clone, Default)]
struct ClassState {
    count: u64,
    word_counts: HashMap<String, u64>,
    total_words: u64,
    amounts: RunningGaussian,
    day_counts: [u64; DAY_BUCKETS],
    month_counts: [u64; MONTH_BUCKETS],
    type_counts: HashMap<AccountType, u64>,
    name_counts: HashMap<String, u64>,
}

impl ClassState {
    fn observe(&mut self, tx: &TransactionFeatures, tokens: &[String]) {
        self.count += 1;
        for token in tokens {
            *self.word_counts.entry(token.clone()).or_default() += 1;
            self.total_words += 1;
        }
        self.amounts.push(tx.amount);
        self.day_counts[day_bucket(tx.timestamp)] += 1;
        self.month_counts[month_bucket(tx.timestamp)] += 1;
        *self.type_counts.entry(tx.account_type).or_default() += 1;
        *self.name_counts.entry(tx.account_name.clone()).or_default() += 1;
    }

    fn word_likelihood(&self, token: &str, vocab_size: f64) -> f64 {
        let count = self.word_counts.get(token).copied().unwrap_or(0) as f64;
        (count + ALPHA) / (self.total_words as f64 + ALPHA * vocab_size)
    }

    fn day_likelihood(&self, bucket: usize) -> f64 {
        (self.day_counts[bucket] as f64 + ALPHA)
            / (self.count as f64 + DAY_BUCKETS as f64 * ALPHA)
    }

    fn month_likelihood(&self, bucket: usize) -> f64 {
        (self.month_counts[bucket] as f64 + ALPHA)
            / (self.count as f64 + MONTH_BUCKETS as f64 * ALPHA)
    }

    fn type_likelihood(&self, ty: AccountType) -> f64 {
        let count = self.type_counts.get(&ty).copied().unwrap_or(0) as f64;
        (count + ALPHA) / (self.count as f64 + ALPHA * AccountType::ALL.len() as f64)
    }

    fn name_likelihood(&self, name: &str, name_count: f64) -> f64 {
        let count = self.name_counts.get(name).copied().unwrap_or(0) as f64;
        (count + ALPHA) / (self.count as f64 + ALPHA * name_count)
    }

    /// Weighted log-score for this class, excluding the prior.
    fn log_score(&self, tx: &TransactionFeatures, tokens: &[String], vocab_size: f64, name_count: f64) -> f64 {
        let mut word_score = 0.0;
        for token in tokens {
            word_score += self.word_likelihood(token, vocab_size).ln();
        }

        let amount_score = self.amounts.to_gaussian().log_density(tx.amount);
        let day_score = self.day_likelihood(day_bucket(tx.timestamp)).ln();
        let month_score = self.month_likelihood(month_bucket(tx.timestamp)).ln();
        let type_score = self.type_likelihood(tx.account_type).ln();
        let name_score = self.name_likelihood(&tx.account_name, name_count).ln();

        WORD_WEIGHT * word_score
            + AMOUNT_WEIGHT * amount_score
            + TIME_WEIGHT * (day_score + month_score)
            + ACCOUNT_TYPE_WEIGHT * type_score
            + ACCOUNT_NAME_WEIGHT * name_score
    }
}

/// Incrementally trained subscription-vs-not classifier.
///
/// `train_incremental` mutates the tables per call and must be serialized
/// with concurrent `predict_binary` calls on the same instance; there is
/// no interior locking.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionClassifier {
    subscription: ClassState,
    non_subscription: ClassState,
    vocabulary: HashSet<String>,
    account_names: HashSet<String>,
}

impl SubscriptionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total labeled samples observed so far.
    pub fn sample_count(&self) -> u64 {
        self.subscription.count + self.non_subscription.count
    }

    /// Fold one labeled sample into the model.
    pub fn train_incremental(
        &mut self,
        tx: &TransactionFeatures,
        is_subscription: bool,
    ) -> Result<()> {
        tx.validate()?;

        let tokens = tokenize(&tx.description);
        self.vocabulary.extend(tokens.iter().cloned());
        self.account_names.insert(tx.account_name.clone());

        if is_subscription {
            self.subscription.observe(tx, &tokens);
        } else {
            self.non_subscription.observe(tx, &tokens);
        }
        debug!(
            subscription = self.subscription.count,
            non_subscription = self.non_subscription.count,
            "Updated subscription model"
        );
        Ok(())
    }

    /// Reset and retrain from a labeled history.
    ///
    /// A sample counts as a subscription when its label is
    /// [`SUBSCRIPTION_LABEL`]. Empty input is logged and ignored,
    /// keeping the existing tables.
    pub fn train(&mut self, samples: &[TransactionFeatures]) -> Result<()> {
        if samples.is_empty() {
            warn!("No transactions available for subscription training; keeping existing model");
            return Ok(());
        }

        let mut fresh = Self::new();
        for tx in samples {
            let is_subscription = tx.training_label()? == SUBSCRIPTION_LABEL;
            fresh.train_incremental(tx, is_subscription)?;
        }
        *self = fresh;
        Ok(())
    }

    /// P(subscription) for one transaction, in [0, 1].
    ///
    /// Returns exactly 0.5 for an untrained model, and falls back to 0.5
    /// if the score computation degenerates to NaN.
    pub fn predict_binary(&self, tx: &TransactionFeatures) -> f64 {
        if self.sample_count() == 0 {
            return 0.5;
        }

        let total = self.sample_count() as f64;
        let sub_prior = (self.subscription.count as f64 + ALPHA) / (total + 2.0 * ALPHA);
        let non_prior = (self.non_subscription.count as f64 + ALPHA) / (total + 2.0 * ALPHA);

        let tokens = tokenize(&tx.description);
        let vocab_size = self.vocabulary.len().max(1) as f64;
        let name_count = self.account_names.len().max(1) as f64;

        let log_sub =
            sub_prior.ln() + self.subscription.log_score(tx, &tokens, vocab_size, name_count);
        let log_non =
            non_prior.ln() + self.non_subscription.log_score(tx, &tokens, vocab_size, name_count);

        // Stable sigmoid of the log-odds; equivalent to
        // exp(s) / (exp(s) + exp(n)) without the overflow.
        let prob = 1.0 / (1.0 + (log_non - log_sub).exp());
        if prob.is_nan() {
            0.5
        } else {
            prob
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tx(
        desc: &str,
        amount: f64,
        when: NaiveDateTime,
        label: Option<&str>,
    ) -> TransactionFeatures {
        TransactionFeatures::new(
            desc,
            amount,
            when,
            label.map(str::to_string),
            AccountType::CreditCard,
            "Rewards",
        )
        .unwrap()
    }

    fn trained() -> SubscriptionClassifier {
        let mut model = SubscriptionClassifier::new();
        // Monthly streaming charges, fixed amount
        for month in 1..=6 {
            model
                .train_incremental(&tx("NETFLIX.COM", 15.99, at(2024, month, 3), None), true)
                .unwrap();
            model
                .train_incremental(&tx("SPOTIFY USA", 10.99, at(2024, month, 5), None), true)
                .unwrap();
        }
        // One-off retail
        model
            .train_incremental(&tx("HOME DEPOT 4412", 184.23, at(2024, 2, 17), None), false)
            .unwrap();
        model
            .train_incremental(&tx("FRED MEYER GROCERY", 96.40, at(2024, 3, 9), None), false)
            .unwrap();
        model
            .train_incremental(&tx("SHELL OIL 5521", 41.75, at(2024, 4, 22), None), false)
            .unwrap();
        model
    }

    #[test]
    fn test_untrained_model_returns_exactly_half() {
        let model = SubscriptionClassifier::new();
        let probe = tx("NETFLIX.COM", 15.99, at(2024, 7, 3), None);
        assert_eq!(model.predict_binary(&probe), 0.5);
    }

    #[test]
    fn test_recognizes_known_subscription() {
        let model = trained();
        let probe = tx("NETFLIX.COM", 15.99, at(2024, 7, 3), None);
        let prob = model.predict_binary(&probe);
        assert!(prob > 0.5, "known subscription scored {}", prob);
    }

    #[test]
    fn test_one_off_scores_below_subscription() {
        let model = trained();
        let one_off = model.predict_binary(&tx("HOME DEPOT 4412", 190.0, at(2024, 7, 10), None));
        let recurring = model.predict_binary(&tx("SPOTIFY USA", 10.99, at(2024, 7, 5), None));
        assert!(recurring > one_off);
    }

    #[test]
    fn test_probability_is_always_valid() {
        let model = trained();
        let probes = [
            tx("ZZYZX UNKNOWN", 9_999_999.0, at(2024, 8, 1), None),
            tx("NETFLIX.COM", 0.01, at(2024, 8, 1), None),
            tx("1234567890", 15.99, at(2024, 8, 1), None),
        ];
        for probe in &probes {
            let prob = model.predict_binary(probe);
            assert!((0.0..=1.0).contains(&prob), "out of range: {}", prob);
            assert!(!prob.is_nan());
        }
    }

    #[test]
    fn test_batch_train_resets_previous_state() {
        let mut model = trained();
        let relabeled = vec![
            tx("GYM MEMBERSHIP", 45.0, at(2024, 1, 2), Some(SUBSCRIPTION_LABEL)),
            tx("GYM MEMBERSHIP", 45.0, at(2024, 2, 2), Some(SUBSCRIPTION_LABEL)),
            tx("CAR REPAIR", 612.0, at(2024, 3, 14), Some(NON_SUBSCRIPTION_LABEL)),
        ];
        model.train(&relabeled).unwrap();
        assert_eq!(model.sample_count(), 3);
    }

    #[test]
    fn test_batch_train_empty_is_a_noop() {
        let mut model = trained();
        let before = model.sample_count();
        model.train(&[]).unwrap();
        assert_eq!(model.sample_count(), before);
    }

    #[test]
    fn test_batch_train_requires_labels() {
        let mut model = SubscriptionClassifier::new();
        let unlabeled = vec![tx("NETFLIX.COM", 15.99, at(2024, 1, 3), None)];
        assert!(model.train(&unlabeled).is_err());
    }

    #[test]
    fn test_priors_shift_with_class_balance() {
        let mut skewed = SubscriptionClassifier::new();
        for month in 1..=6 {
            skewed
                .train_incremental(&tx("NETFLIX.COM", 15.99, at(2024, month, 3), None), true)
                .unwrap();
        }
        // Every observation was a subscription; a neutral merchant should
        // lean that way purely on the prior
        let probe = tx("SOMETHING ELSE", 15.99, at(2024, 7, 3), None);
        assert!(skewed.predict_binary(&probe) > 0.5);
    }
}
