use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use matchcast::backtest::{self, DEFAULT_BINS};
use matchcast::config::Config;
use matchcast::ensemble::{self, ENSEMBLE};
use matchcast::store;

const DEFAULT_DAYS: i64 = 30;

fn main() -> Result<()> {
    let cfg = Config::from_env();

    let db_path = parse_db_path_arg()
        .or_else(|| cfg.resolve_db_path())
        .context("unable to resolve sqlite path")?;
    let conn = store::open_db(&db_path)?;

    let days = parse_i64_arg("--days").unwrap_or(DEFAULT_DAYS).max(1);
    let now = Utc::now();
    let end = parse_str_arg("--end")
        .unwrap_or_else(|| now.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let start = parse_str_arg("--start").unwrap_or_else(|| {
        (now - Duration::days(days))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    });
    let bins = parse_usize_arg("--bins").unwrap_or(DEFAULT_BINS).max(1);
    let apply = has_flag("--apply");

    let models = match parse_str_arg("--model") {
        Some(model) => vec![model],
        None => backtest::default_models(),
    };

    let metrics = backtest::run_backtest(&conn, &start, &end, &models)?;

    println!("Backtest {start} .. {end}");
    println!("DB: {}", db_path.display());
    println!();
    println!(
        "{:<18} {:>8} {:>9} {:>7} {:>6}",
        "model", "accuracy", "log-loss", "brier", "n"
    );
    for model in &models {
        let Some(m) = metrics.get(model) else {
            continue;
        };
        println!(
            "{model:<18} {:>8.3} {:>9.4} {:>7.4} {:>6}",
            m.accuracy, m.log_loss, m.brier_score, m.count
        );
    }

    // Accuracy-proportional weights the combiner could adopt next run.
    let performances: HashMap<String, f64> = ensemble::EXPERTS
        .iter()
        .filter_map(|name| {
            let m = metrics.get(*name)?;
            (m.count > 0).then(|| (name.to_string(), m.accuracy))
        })
        .collect();
    if !performances.is_empty() {
        println!();
        println!("Suggested expert weights:");
        for (name, weight) in ensemble::derive_weights(&performances).entries() {
            println!("  {name:<18} {weight:.3}");
        }
    }

    let records = store::load_backtest_records(&conn, ENSEMBLE, &start, &end)?;
    if !records.is_empty() {
        let cal = backtest::compute_calibration(&records, bins);
        println!();
        println!("Ensemble calibration ({bins} bins, home-win probability):");
        println!("{:>10} {:>10}", "stated", "observed");
        for (confidence, accuracy) in cal.confidence.iter().zip(cal.accuracy.iter()) {
            println!("{confidence:>10.3} {accuracy:>10.3}");
        }
    }

    if apply {
        let mut saved = 0usize;
        for model in &models {
            let Some(m) = metrics.get(model) else {
                continue;
            };
            store::save_metric(&conn, model, "accuracy", m.accuracy, &start, &end, m.count)?;
            store::save_metric(&conn, model, "log_loss", m.log_loss, &start, &end, m.count)?;
            store::save_metric(&conn, model, "brier_score", m.brier_score, &start, &end, m.count)?;
            saved += 3;
        }
        println!();
        println!("Saved {saved} metric rows");
    }

    Ok(())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_str_arg("--db").map(PathBuf::from)
}

fn parse_i64_arg(name: &str) -> Option<i64> {
    parse_str_arg(name)?.parse::<i64>().ok()
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_str_arg(name)?.parse::<usize>().ok()
}

fn parse_str_arg(name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
        {
            let trimmed = next.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
