use crate::features::FeatureVector;
use crate::outcome::{ModelDetails, OutcomePrediction, Prob3, format_score, score_grid_probs};
use crate::poisson::{MAX_SCORE, mean_or, rate_ok, round_score};

const DEFAULT_HOME_MU: f64 = 1.5;
const DEFAULT_AWAY_MU: f64 = 1.2;
const DEFAULT_ALPHA: f64 = 1.0;
const MU_FLOOR: f64 = 0.1;
const ALPHA_FLOOR: f64 = 0.1;

/// Fitted per-side mean and dispersion. Large alpha means low dispersion
/// (the distribution degenerates toward Poisson).
#[derive(Debug, Clone, Copy)]
pub struct NegBinomParams {
    pub home_mu: f64,
    pub away_mu: f64,
    pub home_alpha: f64,
    pub away_alpha: f64,
}

/// Method-of-moments fit. Dispersion is only estimated when the sample
/// variance actually exceeds the mean; otherwise alpha stays at 1.0.
pub fn fit(home_goals: &[u32], away_goals: &[u32], features: &FeatureVector) -> NegBinomParams {
    let (home_mu_raw, home_alpha) = side_moments(home_goals, DEFAULT_HOME_MU);
    let (away_mu_raw, away_alpha) = side_moments(away_goals, DEFAULT_AWAY_MU);

    NegBinomParams {
        home_mu: home_mu_raw * features.home_attack_strength * features.away_defense_strength,
        away_mu: away_mu_raw * features.away_attack_strength * features.home_defense_strength,
        home_alpha,
        away_alpha,
    }
}

pub fn predict(params: &NegBinomParams, features: &FeatureVector) -> OutcomePrediction {
    let home_mu = params.home_mu * (0.5 + features.home_form);
    let away_mu = params.away_mu * (0.5 + features.away_form);

    if !rate_ok(home_mu) || !rate_ok(away_mu) || !rate_ok(params.home_alpha) || !rate_ok(params.away_alpha) {
        return default_prediction();
    }

    let probs = score_grid_probs(
        &pmf(params.home_alpha, home_mu, MAX_SCORE),
        &pmf(params.away_alpha, away_mu, MAX_SCORE),
    );

    OutcomePrediction {
        probs,
        predicted_score: format_score(round_score(home_mu), round_score(away_mu)),
        confidence: None,
        details: ModelDetails::NegativeBinomial {
            home_mu,
            away_mu,
            home_alpha: params.home_alpha,
            away_alpha: params.away_alpha,
        },
    }
}

pub fn default_prediction() -> OutcomePrediction {
    OutcomePrediction {
        probs: Prob3::neutral(),
        predicted_score: "1-1".to_string(),
        confidence: None,
        details: ModelDetails::NegativeBinomial {
            home_mu: DEFAULT_HOME_MU,
            away_mu: DEFAULT_AWAY_MU,
            home_alpha: DEFAULT_ALPHA,
            away_alpha: DEFAULT_ALPHA,
        },
    }
}

fn side_moments(goals: &[u32], default_mu: f64) -> (f64, f64) {
    if goals.len() < 2 {
        return (mean_or(goals, default_mu).max(MU_FLOOR), DEFAULT_ALPHA);
    }

    let mean = mean_or(goals, default_mu);
    let var = goals
        .iter()
        .map(|&g| {
            let d = g as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / goals.len() as f64;

    let alpha = if var > mean {
        (mean * mean / (var - mean)).max(ALPHA_FLOOR)
    } else {
        DEFAULT_ALPHA
    };

    (mean.max(MU_FLOOR), alpha)
}

/// Negative-binomial pmf over 0..=max_score with number-of-successes alpha and
/// success probability `p = alpha / (alpha + mu)`, via the recurrence
/// `pmf(k) = pmf(k-1) * (k - 1 + alpha) / k * (1 - p)` (exact for real alpha).
pub fn pmf(alpha: f64, mu: f64, max_score: u32) -> Vec<f64> {
    let p = alpha / (alpha + mu);
    let mut out = vec![0.0; max_score as usize + 1];
    out[0] = p.powf(alpha);
    for k in 1..out.len() {
        let kf = k as f64;
        out[k] = out[k - 1] * (kf - 1.0 + alpha) / kf * (1.0 - p);
    }
    out
}
