//! Command implementations for the Tuck CLI

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

use tuck_core::{
    load_history, suggest_envelopes, AccountType, ClassifierEnsemble, SubscriptionClassifier,
    TransactionFeatures,
};

use crate::cli::SampleArgs;

/// Build the prediction sample from CLI arguments.
fn sample_from_args(args: &SampleArgs) -> Result<TransactionFeatures> {
    let date = match &args.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))?,
        None => Utc::now().date_naive(),
    };
    let timestamp: NaiveDateTime = date
        .and_hms_opt(12, 0, 0)
        .context("failed to build timestamp")?;

    let account_type: AccountType = args
        .account_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let sample = TransactionFeatures::new(
        args.description.clone(),
        args.amount,
        timestamp,
        None,
        account_type,
        args.account_name.clone(),
    )?;
    Ok(sample)
}

/// Sort a label->probability map by descending probability.
fn ranked(dist: HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = dist.into_iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries
}

fn print_ranked(entries: &[(String, f64)], json: bool) -> Result<()> {
    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(label, prob)| (label.clone(), serde_json::json!(prob)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No prediction (model has no confident labels for this transaction)");
        return Ok(());
    }
    for (label, prob) in entries {
        println!("{:>6.1}%  {}", prob * 100.0, label);
    }
    Ok(())
}

pub fn cmd_classify(history: &Path, args: &SampleArgs, json: bool) -> Result<()> {
    let samples = load_history(history)?;
    let sample = sample_from_args(args)?;

    let mut ensemble = ClassifierEnsemble::new();
    ensemble.train_all(&samples)?;

    let entries = ranked(ensemble.predict(&sample));
    print_ranked(&entries, json)
}

pub fn cmd_subscription(history: &Path, args: &SampleArgs, json: bool) -> Result<()> {
    let samples = load_history(history)?;
    let sample = sample_from_args(args)?;

    let mut model = SubscriptionClassifier::new();
    model.train(&samples)?;

    let prob = model.predict_binary(&sample);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "subscription_probability": prob,
            }))?
        );
    } else {
        println!("P(subscription) = {:.3}", prob);
        if prob > 0.5 {
            println!("Looks like a recurring subscription");
        } else {
            println!("Looks like a one-off transaction");
        }
    }
    Ok(())
}

pub fn cmd_suggest(history: &Path, account_name: &str, days: i64, json: bool) -> Result<()> {
    let samples = load_history(history)?;
    let since = Utc::now().naive_utc() - Duration::days(days);

    let entries = ranked(suggest_envelopes(&samples, account_name, since));

    if entries.is_empty() && !json {
        println!(
            "No activity for account '{}' in the last {} days",
            account_name, days
        );
        return Ok(());
    }
    print_ranked(&entries, json)
}
