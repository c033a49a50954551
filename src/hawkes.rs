use rand::Rng;

use crate::features::FeatureVector;
use crate::outcome::{ModelDetails, OutcomePrediction, Prob3, format_score};
use crate::poisson::mean_or;

/// Intensity jump after a goal and its exponential decay rate, i.e. the
/// kernel `EXCITATION * exp(-DECAY * dt)` on top of the base intensity.
const EXCITATION: f64 = 0.2;
const DECAY: f64 = 1.0;

const MATCH_MINUTES: f64 = 90.0;
const SIMULATIONS: usize = 100;

const DEFAULT_BASE_HOME: f64 = 0.05;
const DEFAULT_BASE_AWAY: f64 = 0.04;
const BASE_FLOOR: f64 = 0.01;

/// Zero-intensity fallback: home/away default to 0.45 each, draw is the
/// residual.
const FALLBACK_SIDE_PROB: f64 = 0.45;

/// Fitted per-side base intensities (goals per minute).
#[derive(Debug, Clone, Copy)]
pub struct HawkesParams {
    pub base_home: f64,
    pub base_away: f64,
}

/// Base intensities from goal-history means scaled down to per-minute rates,
/// then adjusted by current form.
pub fn fit(home_goals: &[u32], away_goals: &[u32], features: &FeatureVector) -> HawkesParams {
    let base_home = if home_goals.is_empty() {
        DEFAULT_BASE_HOME
    } else {
        (mean_or(home_goals, 0.0) * 0.05).max(BASE_FLOOR)
    };
    let base_away = if away_goals.is_empty() {
        DEFAULT_BASE_AWAY
    } else {
        (mean_or(away_goals, 0.0) * 0.04).max(BASE_FLOOR)
    };

    HawkesParams {
        base_home: base_home * (0.5 + features.home_form),
        base_away: base_away * (0.5 + features.away_form),
    }
}

pub fn predict(params: &HawkesParams) -> OutcomePrediction {
    predict_with_rng(params, &mut rand::thread_rng())
}

/// Two separable responsibilities: the stochastic simulations supply the
/// scoreline (and diagnostic count distribution), while the outcome
/// probabilities come from the closed-form intensity ratio so they stay
/// stable across runs.
pub fn predict_with_rng<R: Rng>(params: &HawkesParams, rng: &mut R) -> OutcomePrediction {
    if !params.base_home.is_finite() || !params.base_away.is_finite() {
        return default_prediction();
    }

    let simulated_home = simulate_counts(params.base_home, rng);
    let simulated_away = simulate_counts(params.base_away, rng);

    let home_intensity = params.base_home.max(0.0) * MATCH_MINUTES;
    let away_intensity = params.base_away.max(0.0) * MATCH_MINUTES;
    let total_intensity = home_intensity + away_intensity;

    let (home, away) = if total_intensity > 0.0 {
        (
            home_intensity / total_intensity,
            away_intensity / total_intensity,
        )
    } else {
        (FALLBACK_SIDE_PROB, FALLBACK_SIDE_PROB)
    };
    let draw = (1.0 - home - away).max(0.0);
    let probs = Prob3 { home, draw, away }.normalized();

    let score_home = simulated_home.first().copied().unwrap_or(1);
    let score_away = simulated_away.first().copied().unwrap_or(1);

    OutcomePrediction {
        probs,
        predicted_score: format_score(score_home, score_away),
        confidence: None,
        details: ModelDetails::Hawkes {
            base_home: params.base_home,
            base_away: params.base_away,
            simulated_home,
            simulated_away,
        },
    }
}

pub fn default_prediction() -> OutcomePrediction {
    OutcomePrediction {
        probs: Prob3 {
            home: 0.35,
            draw: 0.32,
            away: 0.33,
        },
        predicted_score: "1-1".to_string(),
        confidence: None,
        details: ModelDetails::Hawkes {
            base_home: DEFAULT_BASE_HOME,
            base_away: DEFAULT_BASE_AWAY,
            simulated_home: Vec::new(),
            simulated_away: Vec::new(),
        },
    }
}

/// Ogata thinning over one match per run. Each accepted goal bumps the
/// intensity by the kernel value at lag zero.
fn simulate_counts<R: Rng>(base_intensity: f64, rng: &mut R) -> Vec<u32> {
    if base_intensity <= 0.0 {
        return vec![0; SIMULATIONS];
    }

    let mut counts = Vec::with_capacity(SIMULATIONS);
    for _ in 0..SIMULATIONS {
        let mut goals = 0u32;
        let mut t = 0.0_f64;
        let mut intensity = base_intensity;

        while t < MATCH_MINUTES {
            let u: f64 = rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
            t += -u.ln() / intensity;
            if t >= MATCH_MINUTES {
                break;
            }
            if rng.r#gen::<f64>() < intensity / (base_intensity * 2.0) {
                goals += 1;
                intensity = base_intensity + EXCITATION * (-DECAY * 0.0_f64).exp();
            }
        }
        counts.push(goals);
    }
    counts
}
