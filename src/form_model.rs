use crate::features::FeatureVector;
use crate::outcome::{ModelDetails, OutcomePrediction, Prob3, format_score};

/// Latent form states, ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Good,
    Medium,
    Poor,
}

impl FormState {
    pub fn index(self) -> usize {
        match self {
            FormState::Good => 0,
            FormState::Medium => 1,
            FormState::Poor => 2,
        }
    }
}

/// Hand-specified state dynamics. Each combiner/model instance owns its own
/// copy so concurrent predictions never share mutable tables.
#[derive(Debug, Clone, Copy)]
pub struct FormTables {
    /// Row = current state, column = next state.
    pub transition: [[f64; 3]; 3],
    /// Row = state, columns = (win, draw, loss) probabilities.
    pub emission: [[f64; 3]; 3],
    /// Expected goals per state, used for the predicted scoreline.
    pub expected_goals: [f64; 3],
}

impl Default for FormTables {
    fn default() -> Self {
        Self {
            transition: [[0.6, 0.3, 0.1], [0.3, 0.5, 0.2], [0.2, 0.4, 0.4]],
            emission: [[0.8, 0.15, 0.05], [0.4, 0.4, 0.2], [0.1, 0.3, 0.6]],
            expected_goals: [1.8, 1.3, 0.8],
        }
    }
}

/// Prior over the home side's own form state.
#[derive(Debug, Clone, Copy)]
pub struct FormParams {
    pub prior: [f64; 3],
}

impl Default for FormParams {
    fn default() -> Self {
        Self {
            prior: [0.33, 0.33, 0.34],
        }
    }
}

/// Coarse win-rate update of the state prior. Results are 1.0 win / 0.5 draw /
/// 0.0 loss; fewer than five results keeps the uninformative prior.
pub fn fit(results: &[f64]) -> FormParams {
    if results.len() < 5 {
        return FormParams::default();
    }

    let win_rate = results.iter().sum::<f64>() / results.len() as f64;
    let prior = if win_rate > 0.6 {
        [0.7, 0.25, 0.05]
    } else if win_rate > 0.4 {
        [0.3, 0.5, 0.2]
    } else {
        [0.1, 0.3, 0.6]
    };
    FormParams { prior }
}

/// One transition step of the prior through the state dynamics.
pub fn advance_prior(tables: &FormTables, prior: [f64; 3]) -> [f64; 3] {
    let mut next = [0.0; 3];
    for (from, p) in prior.iter().enumerate() {
        for (to, n) in next.iter_mut().enumerate() {
            *n += p * tables.transition[from][to];
        }
    }
    next
}

/// Discretize a continuous form score into a state.
pub fn state_from_form(form: f64) -> FormState {
    if form > 0.65 {
        FormState::Good
    } else if form > 0.35 {
        FormState::Medium
    } else {
        FormState::Poor
    }
}

pub fn predict(
    tables: &FormTables,
    params: &FormParams,
    features: &FeatureVector,
) -> OutcomePrediction {
    let home_state = state_from_form(features.home_form);
    let away_state = state_from_form(features.away_form);

    let e_home = tables.emission[home_state.index()];
    let e_away = tables.emission[away_state.index()];

    let home = e_home[0] * (1.0 - e_away[2]);
    let away = e_away[0] * (1.0 - e_home[2]);
    let draw = (1.0 - home - away).max(0.0);
    let probs = Prob3 { home, draw, away }.normalized();

    let home_goals = tables.expected_goals[home_state.index()].round() as u32;
    let away_goals = tables.expected_goals[away_state.index()].round() as u32;

    OutcomePrediction {
        probs,
        predicted_score: format_score(home_goals, away_goals),
        confidence: None,
        details: ModelDetails::Form {
            home_state: home_state.index(),
            away_state: away_state.index(),
            prior: params.prior,
        },
    }
}

pub fn default_prediction() -> OutcomePrediction {
    OutcomePrediction {
        probs: Prob3::neutral(),
        predicted_score: "1-1".to_string(),
        confidence: None,
        details: ModelDetails::Form {
            home_state: FormState::Medium.index(),
            away_state: FormState::Medium.index(),
            prior: FormParams::default().prior,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_keeps_uninformative_prior() {
        let params = fit(&[1.0, 1.0, 1.0]);
        assert_eq!(params.prior, FormParams::default().prior);
    }

    #[test]
    fn win_rate_selects_prior_band() {
        assert_eq!(fit(&[1.0; 8]).prior, [0.7, 0.25, 0.05]);
        assert_eq!(fit(&[0.5; 8]).prior, [0.3, 0.5, 0.2]);
        assert_eq!(fit(&[0.0; 8]).prior, [0.1, 0.3, 0.6]);
    }

    #[test]
    fn advance_prior_stays_a_distribution() {
        let tables = FormTables::default();
        let next = advance_prior(&tables, [0.7, 0.25, 0.05]);
        let sum: f64 = next.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Good form decays toward medium under the dynamics.
        assert!(next[0] < 0.7);
    }

    #[test]
    fn default_prediction_is_neutral() {
        let pred = default_prediction();
        assert!((pred.probs.sum() - 1.0).abs() < 1e-12);
        assert_eq!(pred.predicted_score, "1-1");
    }

    #[test]
    fn good_vs_poor_favors_home() {
        let features = FeatureVector {
            home_form: 0.8,
            away_form: 0.2,
            ..FeatureVector::default()
        };
        let pred = predict(&FormTables::default(), &FormParams::default(), &features);
        assert!(pred.probs.home > pred.probs.away);
        assert_eq!(pred.predicted_score, "2-1");
    }
}
