use rand::SeedableRng;
use rand::rngs::StdRng;

use matchcast::features::FeatureVector;
use matchcast::form_model::{self, FormState};
use matchcast::hawkes::{self, HawkesParams};
use matchcast::negative_binomial::{self, NegBinomParams};
use matchcast::outcome::OutcomePrediction;
use matchcast::poisson::{self, PoissonParams};

fn assert_simplex(pred: &OutcomePrediction, label: &str) {
    let p = &pred.probs;
    assert!(
        p.home >= 0.0 && p.draw >= 0.0 && p.away >= 0.0,
        "{label}: negative probability"
    );
    assert!(
        (p.sum() - 1.0).abs() < 1e-6,
        "{label}: sum {} not 1",
        p.sum()
    );
}

#[test]
fn every_model_emits_a_distribution() {
    let histories: [(&[u32], &[u32]); 3] = [
        (&[], &[]),
        (&[2, 1, 0, 3, 1], &[1, 1, 2, 0]),
        (&[0, 0, 0], &[5, 4, 6, 5]),
    ];
    let forms = [0.0, 0.5, 1.0];

    for (home_goals, away_goals) in histories {
        for form in forms {
            let features = FeatureVector {
                home_form: form,
                away_form: 1.0 - form,
                ..FeatureVector::default()
            };

            let pp = poisson::fit(home_goals, away_goals, &features);
            assert_simplex(&poisson::predict(&pp, &features), "poisson");

            let nb = negative_binomial::fit(home_goals, away_goals, &features);
            assert_simplex(&negative_binomial::predict(&nb, &features), "negative_binomial");

            let hp = hawkes::fit(home_goals, away_goals, &features);
            assert_simplex(
                &hawkes::predict_with_rng(&hp, &mut StdRng::seed_from_u64(3)),
                "hawkes",
            );

            let fp = form_model::fit(&[1.0, 0.5, 0.0, 1.0, 0.5]);
            assert_simplex(
                &form_model::predict(&form_model::FormTables::default(), &fp, &features),
                "form",
            );
        }
    }
}

#[test]
fn identical_sides_give_symmetric_poisson_outcome() {
    let goals = [2u32, 1, 1, 3, 0];
    let params = poisson::fit(&goals, &goals, &FeatureVector::default());
    assert!((params.home_lambda - params.away_lambda).abs() < 1e-12);

    let pred = poisson::predict(&params, &FeatureVector::default());
    assert!(
        (pred.probs.home - pred.probs.away).abs() < 1e-9,
        "home {} vs away {}",
        pred.probs.home,
        pred.probs.away
    );
}

#[test]
fn negative_binomial_degenerates_to_poisson_at_high_alpha() {
    let features = FeatureVector::default();
    let nb = NegBinomParams {
        home_mu: 1.5,
        away_mu: 1.2,
        home_alpha: 1e6,
        away_alpha: 1e6,
    };
    let po = PoissonParams {
        home_lambda: 1.5,
        away_lambda: 1.2,
    };
    let nb_pred = negative_binomial::predict(&nb, &features);
    let po_pred = poisson::predict(&po, &features);
    assert!((nb_pred.probs.home - po_pred.probs.home).abs() < 1e-3);
    assert!((nb_pred.probs.draw - po_pred.probs.draw).abs() < 1e-3);
    assert!((nb_pred.probs.away - po_pred.probs.away).abs() < 1e-3);
}

#[test]
fn hawkes_zero_intensity_hits_documented_fallback() {
    let params = HawkesParams {
        base_home: 0.0,
        base_away: 0.0,
    };
    let pred = hawkes::predict_with_rng(&params, &mut StdRng::seed_from_u64(11));
    assert!((pred.probs.home - 0.45).abs() < 1e-12);
    assert!((pred.probs.away - 0.45).abs() < 1e-12);
    assert!((pred.probs.draw - 0.10).abs() < 1e-12);
    assert!((pred.probs.sum() - 1.0).abs() < 1e-12);
}

#[test]
fn form_thresholds_partition_the_unit_interval() {
    assert_eq!(form_model::state_from_form(0.7), FormState::Good);
    assert_eq!(form_model::state_from_form(0.5), FormState::Medium);
    assert_eq!(form_model::state_from_form(0.2), FormState::Poor);
    // Boundary values fall to the weaker state.
    assert_eq!(form_model::state_from_form(0.65), FormState::Medium);
    assert_eq!(form_model::state_from_form(0.35), FormState::Poor);
}
