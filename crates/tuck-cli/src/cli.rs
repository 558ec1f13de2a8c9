//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tuck - Sort transactions into budget envelopes
#[derive(Parser)]
#[command(name = "tuck")]
#[command(about = "Envelope-budgeting transaction classifier", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// The transaction being classified
#[derive(Args)]
pub struct SampleArgs {
    /// Transaction description (merchant/memo text)
    #[arg(short, long)]
    pub description: String,

    /// Transaction amount (always positive)
    #[arg(short, long)]
    pub amount: f64,

    /// Transaction date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Account type: checking, savings, credit_card, cash, investment
    #[arg(short = 't', long, default_value = "checking")]
    pub account_type: String,

    /// Account name
    #[arg(short = 'n', long, default_value = "default")]
    pub account_name: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the envelope for a transaction
    Classify {
        /// JSON history file of labeled transactions
        #[arg(short = 'f', long)]
        history: PathBuf,

        #[command(flatten)]
        sample: SampleArgs,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Score a transaction as subscription vs one-off
    ///
    /// The history file labels samples with SUBSCRIPTION or
    /// NON_SUBSCRIPTION instead of envelope names.
    Subscription {
        /// JSON history file of labeled transactions
        #[arg(short = 'f', long)]
        history: PathBuf,

        #[command(flatten)]
        sample: SampleArgs,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Suggest envelopes for an account from recent activity
    Suggest {
        /// JSON history file of labeled transactions
        #[arg(short = 'f', long)]
        history: PathBuf,

        /// Account name to suggest envelopes for
        #[arg(short = 'n', long)]
        account_name: String,

        /// Look-back window in days
        #[arg(long, default_value = "30")]
        days: i64,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}
