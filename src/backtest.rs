use std::collections::HashMap;

use anyhow::Result;
use rayon::prelude::*;
use rusqlite::Connection;

use crate::ensemble;
use crate::outcome::{Outcome, Prob3, classify_outcome, one_hot};
use crate::store;

pub const DEFAULT_BINS: usize = 10;

/// Clamp bound for log-loss so a stated probability of 0 or 1 never produces
/// an infinite loss.
pub const EPSILON: f64 = 1e-15;

/// One persisted prediction joined with the actual final score.
#[derive(Debug, Clone)]
pub struct BacktestRecord {
    pub probs: Prob3,
    pub predicted_score: String,
    pub home_goals: i32,
    pub away_goals: i32,
}

impl BacktestRecord {
    pub fn actual(&self) -> Outcome {
        classify_outcome(self.home_goals, self.away_goals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub accuracy: f64,
    pub log_loss: f64,
    pub brier_score: f64,
    pub count: usize,
}

impl Metrics {
    pub fn empty() -> Self {
        Self {
            accuracy: 0.0,
            log_loss: 0.0,
            brier_score: 0.0,
            count: 0,
        }
    }
}

/// Reliability-diagram data: stated confidence vs. empirical home-win rate per
/// non-empty bin. `bin_edges` always carries all N+1 edges.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub confidence: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub bin_edges: Vec<f64>,
}

/// All five persisted model names, ensemble included.
pub fn default_models() -> Vec<String> {
    ensemble::EXPERTS
        .iter()
        .chain([ensemble::ENSEMBLE].iter())
        .map(|name| name.to_string())
        .collect()
}

/// Accuracy, log-loss and Brier score over a joined prediction/result set.
/// Returns the zero-valued record (count 0) when no rows qualify, so callers
/// can tell "no data" apart from "bad data" via the count.
pub fn compute_metrics(records: &[BacktestRecord]) -> Metrics {
    if records.is_empty() {
        return Metrics::empty();
    }

    let mut correct = 0usize;
    let mut log_loss_sum = 0.0_f64;
    let mut brier_sum = 0.0_f64;

    for record in records {
        let actual = record.actual();
        if record.probs.argmax() == actual {
            correct += 1;
        }

        let actual_prob = match actual {
            Outcome::Home => record.probs.home,
            Outcome::Draw => record.probs.draw,
            Outcome::Away => record.probs.away,
        }
        .clamp(EPSILON, 1.0 - EPSILON);
        log_loss_sum += -actual_prob.ln();

        let y = one_hot(actual);
        brier_sum += (record.probs.home - y.home).powi(2)
            + (record.probs.draw - y.draw).powi(2)
            + (record.probs.away - y.away).powi(2);
    }

    let n = records.len() as f64;
    Metrics {
        accuracy: correct as f64 / n,
        log_loss: log_loss_sum / n,
        brier_score: brier_sum / n,
        count: records.len(),
    }
}

/// Partition [0,1] into `bins` equal-width buckets by home-win probability;
/// report mean stated probability against empirical home-win rate for each
/// non-empty bucket.
pub fn compute_calibration(records: &[BacktestRecord], bins: usize) -> Calibration {
    let bins = bins.max(1);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut wins = vec![0usize; bins];

    for record in records {
        let p = record.probs.home.clamp(0.0, 1.0);
        let idx = ((p * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += p;
        if record.actual() == Outcome::Home {
            wins[idx] += 1;
        }
    }

    let mut confidence = Vec::new();
    let mut accuracy = Vec::new();
    for i in 0..bins {
        if counts[i] == 0 {
            continue;
        }
        confidence.push(pred_sum[i] / counts[i] as f64);
        accuracy.push(wins[i] as f64 / counts[i] as f64);
    }

    let bin_edges = (0..=bins).map(|i| i as f64 / bins as f64).collect();
    Calibration {
        confidence,
        accuracy,
        bin_edges,
    }
}

/// Evaluate each model's stored predictions against final scores inside the
/// window. Record sets are loaded per model, then scored in parallel since
/// each model's metrics are independent.
pub fn run_backtest(
    conn: &Connection,
    start: &str,
    end: &str,
    models: &[String],
) -> Result<HashMap<String, Metrics>> {
    let mut loaded: Vec<(String, Vec<BacktestRecord>)> = Vec::with_capacity(models.len());
    for model in models {
        let records = store::load_backtest_records(conn, model, start, end)?;
        loaded.push((model.clone(), records));
    }

    Ok(loaded
        .par_iter()
        .map(|(model, records)| (model.clone(), compute_metrics(records)))
        .collect())
}
