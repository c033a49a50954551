use std::collections::HashMap;

use rand::Rng;

use crate::ensemble::{self, ExpertWeights};
use crate::features::FeatureVector;
use crate::form_model::{self, FormTables};
use crate::hawkes;
use crate::negative_binomial;
use crate::outcome::OutcomePrediction;
use crate::poisson;

/// Bounded window of historical matches fed to the model fits.
pub const HISTORY_WINDOW: usize = 20;

/// Fit and run all four experts plus the combiner for one match. Each model
/// fits lightweight parameters from the history window, predicts, and the
/// combiner fuses the four outputs; the returned map is keyed by model name
/// and includes the "ensemble" entry.
pub fn predict_match(
    features: &FeatureVector,
    home_goals: &[u32],
    away_goals: &[u32],
    home_results: &[f64],
    weights: &ExpertWeights,
) -> HashMap<String, OutcomePrediction> {
    predict_match_with_rng(
        features,
        home_goals,
        away_goals,
        home_results,
        weights,
        &mut rand::thread_rng(),
    )
}

pub fn predict_match_with_rng<R: Rng>(
    features: &FeatureVector,
    home_goals: &[u32],
    away_goals: &[u32],
    home_results: &[f64],
    weights: &ExpertWeights,
    rng: &mut R,
) -> HashMap<String, OutcomePrediction> {
    let mut predictions = HashMap::new();

    let poisson_params = poisson::fit(home_goals, away_goals, features);
    predictions.insert(
        ensemble::POISSON.to_string(),
        poisson::predict(&poisson_params, features),
    );

    let nb_params = negative_binomial::fit(home_goals, away_goals, features);
    predictions.insert(
        ensemble::NEGATIVE_BINOMIAL.to_string(),
        negative_binomial::predict(&nb_params, features),
    );

    let hawkes_params = hawkes::fit(home_goals, away_goals, features);
    predictions.insert(
        ensemble::HAWKES.to_string(),
        hawkes::predict_with_rng(&hawkes_params, rng),
    );

    let form_tables = FormTables::default();
    let form_params = form_model::fit(home_results);
    predictions.insert(
        ensemble::FORM.to_string(),
        form_model::predict(&form_tables, &form_params, features),
    );

    let combined = ensemble::combine(weights, &predictions);
    predictions.insert(ensemble::ENSEMBLE.to_string(), combined);

    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn emits_all_five_predictions() {
        let predictions = predict_match_with_rng(
            &FeatureVector::default(),
            &[2, 1, 0, 3],
            &[1, 1, 2],
            &[1.0, 0.5, 0.0, 1.0, 1.0],
            &ExpertWeights::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(predictions.len(), 5);
        for name in ensemble::EXPERTS.iter().chain([ensemble::ENSEMBLE].iter()) {
            let pred = predictions.get(*name).expect("prediction present");
            assert!((pred.probs.sum() - 1.0).abs() < 1e-6, "{name} not normalized");
        }
    }

    #[test]
    fn empty_history_still_predicts() {
        let predictions = predict_match_with_rng(
            &FeatureVector::default(),
            &[],
            &[],
            &[],
            &ExpertWeights::default(),
            &mut StdRng::seed_from_u64(2),
        );
        assert_eq!(predictions.len(), 5);
    }
}
