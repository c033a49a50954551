use matchcast::features::TeamStatsSource;
use matchcast::outcome::{ModelDetails, OutcomePrediction, Prob3};
use matchcast::store::{self, StoredMatch};

fn finished(match_id: i64, utc_time: &str, home: u32, away: u32, score: (i32, i32)) -> StoredMatch {
    StoredMatch {
        match_id,
        league_id: 2021,
        utc_time: utc_time.to_string(),
        home_team_id: home,
        away_team_id: away,
        home_team: format!("Team {home}"),
        away_team: format!("Team {away}"),
        home_goals: Some(score.0),
        away_goals: Some(score.1),
        status: "FINISHED".to_string(),
    }
}

fn prediction(home: f64, draw: f64, away: f64) -> OutcomePrediction {
    OutcomePrediction {
        probs: Prob3 { home, draw, away },
        predicted_score: "2-1".to_string(),
        confidence: Some(home.max(draw).max(away)),
        details: ModelDetails::Ensemble {
            weights: Vec::new(),
        },
    }
}

#[test]
fn upsert_match_overwrites_on_conflict() {
    let conn = store::open_in_memory().unwrap();

    let mut m = finished(1, "2025-08-01T14:00:00Z", 10, 20, (0, 0));
    m.status = "SCHEDULED".to_string();
    m.home_goals = None;
    m.away_goals = None;
    store::upsert_match(&conn, &m).unwrap();

    // Same row again once the match finished.
    let done = finished(1, "2025-08-01T14:00:00Z", 10, 20, (2, 1));
    store::upsert_match(&conn, &done).unwrap();

    let loaded = store::load_match(&conn, 1).unwrap().unwrap();
    assert!(loaded.is_finished());
    assert_eq!(loaded.home_goals, Some(2));
    assert!(store::load_match(&conn, 99).unwrap().is_none());
}

#[test]
fn scheduled_matches_respect_the_time_cutoff() {
    let conn = store::open_in_memory().unwrap();
    for (id, time) in [(1, "2025-08-02T14:00:00Z"), (2, "2025-08-20T14:00:00Z")] {
        let mut m = finished(id, time, 10, 20, (0, 0));
        m.status = "SCHEDULED".to_string();
        m.home_goals = None;
        m.away_goals = None;
        store::upsert_match(&conn, &m).unwrap();
    }

    let upcoming =
        store::load_scheduled_matches(&conn, 2021, "2025-08-10T00:00:00Z").unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].match_id, 1);
}

#[test]
fn goal_and_result_histories_are_most_recent_first() {
    let conn = store::open_in_memory().unwrap();
    store::upsert_match(&conn, &finished(1, "2025-08-01T14:00:00Z", 10, 20, (3, 0))).unwrap();
    store::upsert_match(&conn, &finished(2, "2025-08-08T14:00:00Z", 10, 30, (1, 1))).unwrap();
    store::upsert_match(&conn, &finished(3, "2025-08-15T14:00:00Z", 40, 10, (2, 0))).unwrap();

    let home_goals = store::load_goal_history(&conn, 10, true, 10).unwrap();
    assert_eq!(home_goals, vec![1, 3]);

    let results = store::load_result_history(&conn, 10, 10).unwrap();
    assert_eq!(results, vec![0.0, 0.5, 1.0]);
}

#[test]
fn refresh_team_stats_aggregates_stored_matches() {
    let conn = store::open_in_memory().unwrap();
    store::upsert_match(&conn, &finished(1, "2025-08-01T14:00:00Z", 10, 20, (3, 0))).unwrap();
    store::upsert_match(&conn, &finished(2, "2025-08-08T14:00:00Z", 30, 10, (2, 2))).unwrap();

    let stats = store::refresh_team_stats(&conn, 10).unwrap();
    assert_eq!(stats.matches_played, 2);
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.goals_for, 5);
    assert_eq!(stats.goals_against, 2);
    assert!((stats.form_rating - 0.75).abs() < 1e-12);

    // Readable back through the stats source trait.
    let loaded = conn.team_aggregates(10).unwrap();
    assert_eq!(loaded.wins, 1);
    assert!(conn.team_aggregates(99).is_none());
}

#[test]
fn backtest_records_join_predictions_with_final_scores() {
    let conn = store::open_in_memory().unwrap();
    store::upsert_match(&conn, &finished(1, "2025-08-01T14:00:00Z", 10, 20, (2, 1))).unwrap();
    let mut pending = finished(2, "2025-08-08T14:00:00Z", 10, 20, (0, 0));
    pending.status = "SCHEDULED".to_string();
    pending.home_goals = None;
    pending.away_goals = None;
    store::upsert_match(&conn, &pending).unwrap();

    store::insert_prediction(&conn, 1, "ensemble", &prediction(0.5, 0.3, 0.2), Some("note"))
        .unwrap();
    store::insert_prediction(&conn, 2, "ensemble", &prediction(0.4, 0.3, 0.3), None).unwrap();

    let records = store::load_backtest_records(
        &conn,
        "ensemble",
        "2025-07-01T00:00:00Z",
        "2025-09-01T00:00:00Z",
    )
    .unwrap();
    // The unfinished match is excluded from the join.
    assert_eq!(records.len(), 1);
    assert!((records[0].probs.home - 0.5).abs() < 1e-12);
    assert_eq!(records[0].home_goals, 2);
}

#[test]
fn prediction_upsert_replaces_the_model_row() {
    let conn = store::open_in_memory().unwrap();
    store::upsert_match(&conn, &finished(1, "2025-08-01T14:00:00Z", 10, 20, (2, 1))).unwrap();

    store::insert_prediction(&conn, 1, "poisson", &prediction(0.4, 0.3, 0.3), None).unwrap();
    store::insert_prediction(&conn, 1, "poisson", &prediction(0.6, 0.25, 0.15), None).unwrap();

    let records = store::load_backtest_records(
        &conn,
        "poisson",
        "2025-07-01T00:00:00Z",
        "2025-09-01T00:00:00Z",
    )
    .unwrap();
    assert_eq!(records.len(), 1);
    assert!((records[0].probs.home - 0.6).abs() < 1e-12);
}

#[test]
fn metric_rows_overwrite_on_the_same_period_key() {
    let conn = store::open_in_memory().unwrap();
    let (start, end) = ("2025-07-01T00:00:00Z", "2025-08-01T00:00:00Z");

    store::save_metric(&conn, "ensemble", "accuracy", 0.5, start, end, 10).unwrap();
    store::save_metric(&conn, "ensemble", "accuracy", 0.6, start, end, 12).unwrap();

    let (value, samples) = store::load_metric(&conn, "ensemble", "accuracy", start, end)
        .unwrap()
        .unwrap();
    assert!((value - 0.6).abs() < 1e-12);
    assert_eq!(samples, 12);

    assert!(
        store::load_metric(&conn, "ensemble", "log_loss", start, end)
            .unwrap()
            .is_none()
    );
}
