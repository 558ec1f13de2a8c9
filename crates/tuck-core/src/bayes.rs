//! Multi-class Naive Bayes envelope classifier
//!
//! Hybrid multinomial/Gaussian model over transaction features:
//! - Description tokens: multinomial with Laplace smoothing
//! - Amount: per-envelope Gaussian
//! - Day-of-week and month: smoothed categorical
//! - Account type and account name: smoothed categorical
//!
//! Scores are combined in log space with fixed per-feature weights and
//! normalized with the log-sum-exp trick, so extreme amounts or long
//! descriptions cannot overflow into NaN probabilities.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::features::{day_bucket, month_bucket, tokenize, DAY_BUCKETS, MONTH_BUCKETS};
use crate::models::{AccountType, TransactionFeatures};
use crate::stats::{normalize_log_scores, Gaussian};

/// Laplace smoothing constant
pub const ALPHA: f64 = 1.0;

/// Feature weights; sum to 1.0
pub const WORD_WEIGHT: f64 = 0.4;
pub const AMOUNT_WEIGHT: f64 = 0.25;
pub const TIME_WEIGHT: f64 = 0.15;
pub const ACCOUNT_TYPE_WEIGHT: f64 = 0.1;
pub const ACCOUNT_NAME_WEIGHT: f64 = 0.1;

/// A training sample paired with its validated label.
type Labeled<'a> = (&'a str, &'a TransactionFeatures);

/// Batch-trained Naive Bayes classifier mapping transactions to envelopes.
///
/// `train` rebuilds every probability table from the full sample set;
/// `predict` is read-only. Training takes `&mut self` and prediction
/// `&self`, so a shared instance needs the usual single-writer discipline
/// (an `RwLock`, or training a fresh instance and swapping it in).
#[derive(Debug, Clone, Default)]
pub struct NaiveBayesClassifier {
    priors: HashMap<String, f64>,
    word_likelihoods: HashMap<String, HashMap<String, f64>>,
    amount_distributions: HashMap<String, Gaussian>,
    day_likelihoods: HashMap<String, [f64; DAY_BUCKETS]>,
    month_likelihoods: HashMap<String, [f64; MONTH_BUCKETS]>,
    account_type_likelihoods: HashMap<String, HashMap<AccountType, f64>>,
    account_name_likelihoods: HashMap<String, HashMap<String, f64>>,
    vocabulary: HashSet<String>,
    account_names: HashSet<String>,
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `train` has run on a non-empty sample set.
    pub fn is_trained(&self) -> bool {
        !self.priors.is_empty()
    }

    /// Envelope labels this model knows about.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.priors.keys().map(String::as_str)
    }

    /// Rebuild all probability tables from `samples`.
    ///
    /// Every sample must satisfy the structural invariants and carry a
    /// label. An empty sample set is logged and ignored without touching
    /// the existing tables, so a model trained yesterday survives an
    /// empty refresh today.
    pub fn train(&mut self, samples: &[TransactionFeatures]) -> Result<()> {
        if samples.is_empty() {
            warn!("No transactions available for training; keeping existing model");
            return Ok(());
        }

        let mut labeled: Vec<Labeled> = Vec::with_capacity(samples.len());
        for tx in samples {
            tx.validate()?;
            labeled.push((tx.training_label()?, tx));
        }

        self.clear();

        // Label counts and smoothed priors
        let mut label_counts: HashMap<&str, usize> = HashMap::new();
        for &(label, _) in &labeled {
            *label_counts.entry(label).or_default() += 1;
        }
        let total = labeled.len() as f64;
        let num_labels = label_counts.len() as f64;
        for (&label, &count) in &label_counts {
            self.priors.insert(
                label.to_string(),
                (count as f64 + ALPHA) / (total + ALPHA * num_labels),
            );
        }

        // Global vocabulary and distinct account names
        for &(_, tx) in &labeled {
            self.vocabulary.extend(tokenize(&tx.description));
            self.account_names.insert(tx.account_name.clone());
        }

        self.fit_word_likelihoods(&labeled, &label_counts);
        self.fit_amount_distributions(&labeled, &label_counts);
        self.fit_temporal_likelihoods(&labeled, &label_counts);
        self.fit_account_likelihoods(&labeled, &label_counts);

        info!(
            samples = labeled.len(),
            labels = label_counts.len(),
            vocabulary = self.vocabulary.len(),
            "Trained envelope classifier"
        );
        Ok(())
    }

    /// Probability distribution over envelopes for one transaction.
    ///
    /// Values sum to 1 and contain no NaN or negative entries. An
    /// untrained model returns an empty map.
    pub fn predict(&self, tx: &TransactionFeatures) -> HashMap<String, f64> {
        if !self.is_trained() {
            debug!("predict called on untrained model");
            return HashMap::new();
        }

        let tokens = tokenize(&tx.description);
        let day = day_bucket(tx.timestamp);
        let month = month_bucket(tx.timestamp);
        let vocab_size = self.vocabulary.len().max(1) as f64;
        let name_count = self.account_names.len().max(1) as f64;

        let mut scores: HashMap<String, f64> = HashMap::new();
        for (label, prior) in &self.priors {
            let mut score = prior.ln();

            let words = &self.word_likelihoods[label];
            let mut word_score = 0.0;
            for token in &tokens {
                let likelihood = words
                    .get(token)
                    .copied()
                    .unwrap_or(ALPHA / (vocab_size * ALPHA));
                word_score += likelihood.ln();
            }

            let amount_score = self.amount_distributions[label].log_density(tx.amount);

            let day_score = self.day_likelihoods[label][day].ln();
            let month_score = self.month_likelihoods[label][month].ln();

            let type_score = self.account_type_likelihoods[label][&tx.account_type].ln();
            let name_score = self.account_name_likelihoods[label]
                .get(&tx.account_name)
                .copied()
                .unwrap_or(ALPHA / (name_count * ALPHA))
                .ln();

            score += WORD_WEIGHT * word_score
                + AMOUNT_WEIGHT * amount_score
                + TIME_WEIGHT * (day_score + month_score)
                + ACCOUNT_TYPE_WEIGHT * type_score
                + ACCOUNT_NAME_WEIGHT * name_score;

            scores.insert(label.clone(), score);
        }

        normalize_log_scores(scores)
    }

    fn clear(&mut self) {
        self.priors.clear();
        self.word_likelihoods.clear();
        self.amount_distributions.clear();
        self.day_likelihoods.clear();
        self.month_likelihoods.clear();
        self.account_type_likelihoods.clear();
        self.account_name_likelihoods.clear();
        self.vocabulary.clear();
        self.account_names.clear();
    }

    fn fit_word_likelihoods(
        &mut self,
        labeled: &[Labeled<'_>],
        label_counts: &HashMap<&str, usize>,
    ) {
        let mut word_counts: HashMap<&str, HashMap<String, usize>> = HashMap::new();
        for &(label, tx) in labeled {
            let counts = word_counts.entry(label).or_default();
            for token in tokenize(&tx.description) {
                *counts.entry(token).or_default() += 1;
            }
        }

        let vocab_size = self.vocabulary.len() as f64;
        for &label in label_counts.keys() {
            let counts = word_counts.get(label);
            let total_words = counts
                .map(|c| c.values().sum::<usize>())
                .unwrap_or(0) as f64;

            let mut likelihoods = HashMap::with_capacity(self.vocabulary.len());
            for token in &self.vocabulary {
                let count = counts
                    .and_then(|c| c.get(token))
                    .copied()
                    .unwrap_or(0) as f64;
                likelihoods.insert(
                    token.clone(),
                    (count + ALPHA) / (total_words + ALPHA * vocab_size),
                );
            }
            self.word_likelihoods.insert(label.to_string(), likelihoods);
        }
    }

    fn fit_amount_distributions(
        &mut self,
        labeled: &[Labeled<'_>],
        label_counts: &HashMap<&str, usize>,
    ) {
        let mut amounts: HashMap<&str, Vec<f64>> = HashMap::new();
        for &(label, tx) in labeled {
            amounts.entry(label).or_default().push(tx.amount);
        }
        for &label in label_counts.keys() {
            let values = amounts.get(label).map(Vec::as_slice).unwrap_or(&[]);
            self.amount_distributions
                .insert(label.to_string(), Gaussian::fit(values));
        }
    }

    fn fit_temporal_likelihoods(
        &mut self,
        labeled: &[Labeled<'_>],
        label_counts: &HashMap<&str, usize>,
    ) {
        let mut day_counts: HashMap<&str, [usize; DAY_BUCKETS]> = HashMap::new();
        let mut month_counts: HashMap<&str, [usize; MONTH_BUCKETS]> = HashMap::new();
        for &(label, tx) in labeled {
            day_counts.entry(label).or_insert([0; DAY_BUCKETS])[day_bucket(tx.timestamp)] += 1;
            month_counts.entry(label).or_insert([0; MONTH_BUCKETS])
                [month_bucket(tx.timestamp)] += 1;
        }

        for &label in label_counts.keys() {
            let days = day_counts.get(label).copied().unwrap_or([0; DAY_BUCKETS]);
            let total_days = days.iter().sum::<usize>() as f64;
            let mut day_likelihoods = [0.0; DAY_BUCKETS];
            for (bucket, &count) in days.iter().enumerate() {
                day_likelihoods[bucket] =
                    (count as f64 + ALPHA) / (total_days + DAY_BUCKETS as f64 * ALPHA);
            }
            self.day_likelihoods.insert(label.to_string(), day_likelihoods);

            let months = month_counts
                .get(label)
                .copied()
                .unwrap_or([0; MONTH_BUCKETS]);
            let total_months = months.iter().sum::<usize>() as f64;
            let mut month_likelihoods = [0.0; MONTH_BUCKETS];
            for (bucket, &count) in months.iter().enumerate() {
                month_likelihoods[bucket] =
                    (count as f64 + ALPHA) / (total_months + MONTH_BUCKETS as f64 * ALPHA);
            }
            self.month_likelihoods
                .insert(label.to_string(), month_likelihoods);
        }
    }

    fn fit_account_likelihoods(
        &mut self,
        labeled: &[Labeled<'_>],
        label_counts: &HashMap<&str, usize>,
    ) {
        let mut type_counts: HashMap<&str, HashMap<AccountType, usize>> = HashMap::new();
        let mut name_counts: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
        for &(label, tx) in labeled {
            *type_counts
                .entry(label)
                .or_default()
                .entry(tx.account_type)
                .or_default() += 1;
            *name_counts
                .entry(label)
                .or_default()
                .entry(tx.account_name.as_str())
                .or_default() += 1;
        }

        let num_types = AccountType::ALL.len() as f64;
        let num_names = self.account_names.len() as f64;
        for (&label, &label_total) in label_counts {
            let total = label_total as f64;

            let mut type_likelihoods = HashMap::with_capacity(AccountType::ALL.len());
            for ty in AccountType::ALL {
                let count = type_counts
                    .get(label)
                    .and_then(|c| c.get(&ty))
                    .copied()
                    .unwrap_or(0) as f64;
                type_likelihoods.insert(ty, (count + ALPHA) / (total + ALPHA * num_types));
            }
            self.account_type_likelihoods
                .insert(label.to_string(), type_likelihoods);

            let mut name_likelihoods = HashMap::with_capacity(self.account_names.len());
            for name in &self.account_names {
                let count = name_counts
                    .get(label)
                    .and_then(|c| c.get(name.as_str()))
                    .copied()
                    .unwrap_or(0) as f64;
                name_likelihoods.insert(
                    name.clone(),
                    (count + ALPHA) / (total + ALPHA * num_names),
                );
            }
            self.account_name_likelihoods
                .insert(label.to_string(), name_likelihoods);
        }
    }

    #[cfg(test)]
    pub(crate) fn prior_sum(&self) -> f64 {
        self.priors.values().sum()
    }

    #[cfg(test)]
    pub(crate) fn word_likelihood_sum(&self, label: &str) -> f64 {
        self.word_likelihoods[label].values().sum()
    }

    #[cfg(test)]
    pub(crate) fn word_likelihood(&self, label: &str, token: &str) -> Option<f64> {
        self.word_likelihoods.get(label)?.get(token).copied()
    }
}
