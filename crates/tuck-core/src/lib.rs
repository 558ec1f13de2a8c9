//! Tuck Core Library
//!
//! Shared functionality for the Tuck envelope-budgeting classifier:
//! - Feature extraction from raw transactions (tokens, time buckets)
//! - Naive Bayes envelope classifier with Laplace smoothing
//! - Incremental binary subscription classifier
//! - Ensemble blending of general and account-specific models
//! - JSON transaction-history loading

pub mod bayes;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod history;
pub mod models;
pub mod stats;
pub mod subscription;

pub use bayes::NaiveBayesClassifier;
pub use ensemble::{suggest_envelopes, ClassifierEnsemble, MIN_ACCOUNT_SAMPLES, MIN_PROBABILITY};
pub use error::{Error, Result};
pub use features::tokenize;
pub use history::load_history;
pub use models::{AccountType, TransactionFeatures};
pub use subscription::{SubscriptionClassifier, NON_SUBSCRIPTION_LABEL, SUBSCRIPTION_LABEL};
