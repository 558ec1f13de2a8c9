//! Tuck CLI - Envelope-budgeting transaction classifier
//!
//! Usage:
//!   tuck classify -f history.json -d "NETFLIX.COM" -a 15.99
//!   tuck subscription -f labeled.json -d "NETFLIX.COM" -a 15.99
//!   tuck suggest -f history.json -n "Everyday Checking"

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Classify {
            history,
            sample,
            json,
        } => commands::cmd_classify(&history, &sample, json),
        Commands::Subscription {
            history,
            sample,
            json,
        } => commands::cmd_subscription(&history, &sample, json),
        Commands::Suggest {
            history,
            account_name,
            days,
            json,
        } => commands::cmd_suggest(&history, &account_name, days, json),
    }
}
