use std::collections::HashMap;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rand::SeedableRng;
use rand::rngs::StdRng;

use matchcast::backtest::{BacktestRecord, compute_calibration, compute_metrics};
use matchcast::ensemble::{self, ExpertWeights};
use matchcast::features::FeatureVector;
use matchcast::outcome::{ModelDetails, OutcomePrediction, Prob3};
use matchcast::pipeline;
use matchcast::poisson;

fn sample_records(n: usize) -> Vec<BacktestRecord> {
    (0..n)
        .map(|i| {
            let home = 0.2 + 0.6 * (i % 10) as f64 / 10.0;
            let away = (1.0 - home) * 0.6;
            BacktestRecord {
                probs: Prob3 {
                    home,
                    draw: 1.0 - home - away,
                    away,
                },
                predicted_score: "2-1".to_string(),
                home_goals: (i % 4) as i32,
                away_goals: ((i + 1) % 3) as i32,
            }
        })
        .collect()
}

fn sample_predictions() -> HashMap<String, OutcomePrediction> {
    ensemble::EXPERTS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let home = 0.3 + 0.05 * i as f64;
            (
                name.to_string(),
                OutcomePrediction {
                    probs: Prob3 {
                        home,
                        draw: 0.3,
                        away: 0.7 - home,
                    },
                    predicted_score: "2-1".to_string(),
                    confidence: None,
                    details: ModelDetails::Poisson {
                        home_lambda: 1.5,
                        away_lambda: 1.2,
                    },
                },
            )
        })
        .collect()
}

fn bench_poisson_fit_predict(c: &mut Criterion) {
    let home_goals: Vec<u32> = (0..20).map(|i| i % 4).collect();
    let away_goals: Vec<u32> = (0..20).map(|i| (i + 1) % 3).collect();
    let features = FeatureVector::default();

    c.bench_function("poisson_fit_predict", |b| {
        b.iter(|| {
            let params = poisson::fit(black_box(&home_goals), black_box(&away_goals), &features);
            let pred = poisson::predict(&params, &features);
            black_box(pred.probs.home);
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let home_goals: Vec<u32> = (0..20).map(|i| i % 4).collect();
    let away_goals: Vec<u32> = (0..20).map(|i| (i + 1) % 3).collect();
    let home_results: Vec<f64> = (0..20).map(|i| (i % 3) as f64 / 2.0).collect();
    let features = FeatureVector::default();
    let weights = ExpertWeights::default();

    c.bench_function("full_pipeline", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(9);
            let predictions = pipeline::predict_match_with_rng(
                black_box(&features),
                black_box(&home_goals),
                black_box(&away_goals),
                black_box(&home_results),
                &weights,
                &mut rng,
            );
            black_box(predictions.len());
        })
    });
}

fn bench_ensemble_combine(c: &mut Criterion) {
    let weights = ExpertWeights::default();
    let predictions = sample_predictions();

    c.bench_function("ensemble_combine", |b| {
        b.iter(|| {
            let combined = ensemble::combine(black_box(&weights), black_box(&predictions));
            black_box(combined.probs.home);
        })
    });
}

fn bench_metrics_compute(c: &mut Criterion) {
    let records = sample_records(1000);

    c.bench_function("metrics_compute", |b| {
        b.iter(|| {
            let m = compute_metrics(black_box(&records));
            black_box(m.log_loss);
        })
    });
}

fn bench_calibration_compute(c: &mut Criterion) {
    let records = sample_records(1000);

    c.bench_function("calibration_compute", |b| {
        b.iter(|| {
            let cal = compute_calibration(black_box(&records), 10);
            black_box(cal.confidence.len());
        })
    });
}

criterion_group!(
    perf,
    bench_poisson_fit_predict,
    bench_full_pipeline,
    bench_ensemble_combine,
    bench_metrics_compute,
    bench_calibration_compute
);
criterion_main!(perf);
