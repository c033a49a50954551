use std::collections::HashMap;

use crate::outcome::{ModelDetails, OutcomePrediction, Prob3, format_score, parse_score_pair};

pub const POISSON: &str = "poisson";
pub const NEGATIVE_BINOMIAL: &str = "negative_binomial";
pub const HAWKES: &str = "hawkes";
pub const FORM: &str = "form";
pub const ENSEMBLE: &str = "ensemble";

/// The four expert models the combiner fuses.
pub const EXPERTS: [&str; 4] = [POISSON, NEGATIVE_BINOMIAL, HAWKES, FORM];

/// Immutable weight snapshot. Deriving a new snapshot is a separate pure step,
/// so combining is deterministic given its explicit inputs.
#[derive(Debug, Clone)]
pub struct ExpertWeights {
    weights: HashMap<String, f64>,
}

impl Default for ExpertWeights {
    fn default() -> Self {
        Self {
            weights: EXPERTS
                .iter()
                .map(|name| (name.to_string(), 1.0 / EXPERTS.len() as f64))
                .collect(),
        }
    }
}

impl ExpertWeights {
    pub fn get(&self, model: &str) -> f64 {
        self.weights.get(model).copied().unwrap_or(0.0)
    }

    /// Name/weight pairs in stable (sorted) order.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> =
            self.weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Normalize a performance map (e.g. backtest accuracies) into weights that
/// sum to 1. A degenerate map falls back to the uniform snapshot.
pub fn derive_weights(performances: &HashMap<String, f64>) -> ExpertWeights {
    let total: f64 = performances.values().filter(|v| v.is_finite()).sum();
    if total <= 0.0 {
        return ExpertWeights::default();
    }
    ExpertWeights {
        weights: performances
            .iter()
            .filter(|(_, v)| v.is_finite() && **v >= 0.0)
            .map(|(name, perf)| (name.clone(), perf / total))
            .collect(),
    }
}

/// Weighted fusion of the experts' outcome distributions. Models absent from
/// the input map are skipped; malformed scorelines are skipped rather than
/// aborting the combine.
pub fn combine(
    weights: &ExpertWeights,
    predictions: &HashMap<String, OutcomePrediction>,
) -> OutcomePrediction {
    let mut home = 0.0;
    let mut draw = 0.0;
    let mut away = 0.0;
    let mut contributed = false;

    for (name, weight) in &weights.weights {
        let Some(pred) = predictions.get(name) else {
            continue;
        };
        home += weight * pred.probs.home;
        draw += weight * pred.probs.draw;
        away += weight * pred.probs.away;
        contributed = true;
    }

    let details = ModelDetails::Ensemble {
        weights: weights.entries(),
    };

    if !contributed || home + draw + away <= 0.0 {
        return OutcomePrediction {
            probs: Prob3::neutral(),
            predicted_score: "1-1".to_string(),
            confidence: Some(0.5),
            details,
        };
    }

    let probs = Prob3 { home, draw, away }.normalized();
    let predicted_score = combine_scores(weights, predictions);

    let confidences: Vec<f64> = predictions
        .values()
        .map(OutcomePrediction::confidence_or_proxy)
        .collect();
    let confidence = if confidences.is_empty() {
        0.5
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    OutcomePrediction {
        probs,
        predicted_score,
        confidence: Some(confidence),
        details,
    }
}

/// Average each side's integer score across the positively-weighted experts.
fn combine_scores(
    weights: &ExpertWeights,
    predictions: &HashMap<String, OutcomePrediction>,
) -> String {
    let mut home_scores = Vec::new();
    let mut away_scores = Vec::new();

    for (name, weight) in &weights.weights {
        if *weight <= 0.0 {
            continue;
        }
        let Some(pred) = predictions.get(name) else {
            continue;
        };
        let Some((h, a)) = parse_score_pair(&pred.predicted_score) else {
            continue;
        };
        home_scores.push(h as f64);
        away_scores.push(a as f64);
    }

    if home_scores.is_empty() {
        return "1-1".to_string();
    }

    let avg_home = home_scores.iter().sum::<f64>() / home_scores.len() as f64;
    let avg_away = away_scores.iter().sum::<f64>() / away_scores.len() as f64;
    format_score(avg_home.round() as u32, avg_away.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(home: f64, draw: f64, away: f64, score: &str) -> OutcomePrediction {
        OutcomePrediction {
            probs: Prob3 { home, draw, away },
            predicted_score: score.to_string(),
            confidence: None,
            details: ModelDetails::Poisson {
                home_lambda: 1.0,
                away_lambda: 1.0,
            },
        }
    }

    #[test]
    fn derive_weights_normalizes() {
        let mut perf = HashMap::new();
        perf.insert(POISSON.to_string(), 0.6);
        perf.insert(FORM.to_string(), 0.2);
        let w = derive_weights(&perf);
        assert!((w.get(POISSON) - 0.75).abs() < 1e-12);
        assert!((w.get(FORM) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn degenerate_performance_map_is_uniform() {
        let w = derive_weights(&HashMap::new());
        assert!((w.get(POISSON) - 0.25).abs() < 1e-12);
        assert!((w.get(HAWKES) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_input_map_yields_default() {
        let combined = combine(&ExpertWeights::default(), &HashMap::new());
        assert_eq!(combined.predicted_score, "1-1");
        assert!((combined.probs.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_scoreline_is_skipped() {
        let mut predictions = HashMap::new();
        predictions.insert(POISSON.to_string(), pred(0.5, 0.25, 0.25, "junk"));
        predictions.insert(FORM.to_string(), pred(0.5, 0.25, 0.25, "3-0"));
        let combined = combine(&ExpertWeights::default(), &predictions);
        assert_eq!(combined.predicted_score, "3-0");
    }
}
