use crate::features::FeatureVector;
use crate::outcome::{ModelDetails, OutcomePrediction, Prob3, format_score, score_grid_probs};

/// Scores 0..=MAX_SCORE per side are enumerated for the outcome grid.
pub const MAX_SCORE: u32 = 9;

const DEFAULT_HOME_RATE: f64 = 1.5;
const DEFAULT_AWAY_RATE: f64 = 1.2;
const RATE_FLOOR: f64 = 0.1;

/// Fitted per-side goal rates, already adjusted for attack/defense strengths.
#[derive(Debug, Clone, Copy)]
pub struct PoissonParams {
    pub home_lambda: f64,
    pub away_lambda: f64,
}

/// Moment-fit the per-side rates from goal history, then scale by the
/// opposing attack/defense factors. Empty history falls back to league-ish
/// neutral rates; the floor avoids a degenerate zero-rate distribution.
pub fn fit(home_goals: &[u32], away_goals: &[u32], features: &FeatureVector) -> PoissonParams {
    let home_lambda = mean_or(home_goals, DEFAULT_HOME_RATE).max(RATE_FLOOR)
        * features.home_attack_strength
        * features.away_defense_strength;
    let away_lambda = mean_or(away_goals, DEFAULT_AWAY_RATE).max(RATE_FLOOR)
        * features.away_attack_strength
        * features.home_defense_strength;
    PoissonParams {
        home_lambda,
        away_lambda,
    }
}

/// Outcome distribution from two independent Poisson score distributions.
/// Total for any input; degenerate rates yield the documented neutral default.
pub fn predict(params: &PoissonParams, features: &FeatureVector) -> OutcomePrediction {
    let home_lambda = params.home_lambda * (0.5 + features.home_form);
    let away_lambda = params.away_lambda * (0.5 + features.away_form);

    if !rate_ok(home_lambda) || !rate_ok(away_lambda) {
        return default_prediction();
    }

    let probs = score_grid_probs(&pmf(home_lambda, MAX_SCORE), &pmf(away_lambda, MAX_SCORE));

    OutcomePrediction {
        probs,
        predicted_score: format_score(round_score(home_lambda), round_score(away_lambda)),
        confidence: None,
        details: ModelDetails::Poisson {
            home_lambda,
            away_lambda,
        },
    }
}

pub fn default_prediction() -> OutcomePrediction {
    OutcomePrediction {
        probs: Prob3::neutral(),
        predicted_score: "1-1".to_string(),
        confidence: None,
        details: ModelDetails::Poisson {
            home_lambda: DEFAULT_HOME_RATE,
            away_lambda: DEFAULT_AWAY_RATE,
        },
    }
}

/// Poisson pmf over 0..=max_score, computed by the stable recurrence
/// `p(k) = p(k-1) * lambda / k`.
pub fn pmf(lambda: f64, max_score: u32) -> Vec<f64> {
    let mut out = vec![0.0; max_score as usize + 1];
    out[0] = (-lambda).exp();
    for k in 1..out.len() {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

pub(crate) fn mean_or(goals: &[u32], default: f64) -> f64 {
    if goals.is_empty() {
        default
    } else {
        goals.iter().map(|&g| g as f64).sum::<f64>() / goals.len() as f64
    }
}

pub(crate) fn rate_ok(lambda: f64) -> bool {
    lambda.is_finite() && lambda > 0.0
}

pub(crate) fn round_score(lambda: f64) -> u32 {
    lambda.round().clamp(0.0, MAX_SCORE as f64) as u32
}
