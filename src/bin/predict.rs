use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};

use matchcast::config::Config;
use matchcast::ensemble::{ENSEMBLE, ExpertWeights};
use matchcast::features;
use matchcast::http_client::http_client;
use matchcast::narrative;
use matchcast::news_fetch::NewsSentimentSource;
use matchcast::outcome::OutcomePrediction;
use matchcast::pipeline::{self, HISTORY_WINDOW};
use matchcast::store::{self, StoredMatch};

const DEFAULT_DAYS_AHEAD: i64 = 7;

fn main() -> Result<()> {
    let cfg = Config::from_env();

    let db_path = parse_db_path_arg()
        .or_else(|| cfg.resolve_db_path())
        .context("unable to resolve sqlite path")?;
    let conn = store::open_db(&db_path)?;

    let use_news = has_flag("--news");
    let league_id = parse_u32_arg("--league").unwrap_or(cfg.default_league_id);

    let matches = if let Some(match_id) = parse_i64_arg("--match") {
        let m = store::load_match(&conn, match_id)?
            .ok_or_else(|| anyhow!("match {match_id} not found; run ingest first"))?;
        vec![m]
    } else {
        let days_ahead = parse_i64_arg("--days").unwrap_or(DEFAULT_DAYS_AHEAD).max(0);
        let until = (Utc::now() + Duration::days(days_ahead))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        store::load_scheduled_matches(&conn, league_id, &until)?
    };

    if matches.is_empty() {
        println!("No scheduled matches in window; run ingest first.");
        return Ok(());
    }

    let client = http_client()?;
    let sentiment = NewsSentimentSource::new(client, &cfg);
    let weights = ExpertWeights::default();

    for m in &matches {
        let f = features::build_features(
            m.home_team_id,
            m.away_team_id,
            &m.home_team,
            &m.away_team,
            use_news,
            &conn,
            &sentiment,
        );
        let home_goals = store::load_goal_history(&conn, m.home_team_id, true, HISTORY_WINDOW)?;
        let away_goals = store::load_goal_history(&conn, m.away_team_id, false, HISTORY_WINDOW)?;
        let home_results = store::load_result_history(&conn, m.home_team_id, HISTORY_WINDOW)?;

        let predictions =
            pipeline::predict_match(&f, &home_goals, &away_goals, &home_results, &weights);

        let explanation = predictions
            .get(ENSEMBLE)
            .map(|pred| narrative::explain_prediction(client, &cfg, &m.home_team, &m.away_team, pred));

        for (model, pred) in &predictions {
            let note = if model == ENSEMBLE {
                explanation.as_deref()
            } else {
                None
            };
            store::insert_prediction(&conn, m.match_id, model, pred, note)?;
        }

        print_report(m, &predictions, explanation.as_deref());
    }

    Ok(())
}

fn print_report(
    m: &StoredMatch,
    predictions: &std::collections::HashMap<String, OutcomePrediction>,
    explanation: Option<&str>,
) {
    println!();
    println!("{} vs {}  ({})", m.home_team, m.away_team, m.utc_time);

    let mut names = predictions.keys().cloned().collect::<Vec<_>>();
    names.sort();
    // Ensemble last, it is the headline row.
    names.retain(|n| n != ENSEMBLE);
    names.push(ENSEMBLE.to_string());

    for name in &names {
        let Some(pred) = predictions.get(name) else {
            continue;
        };
        println!(
            "  {name:<18} H {:>5.1}%  D {:>5.1}%  A {:>5.1}%  score {}  conf {:.2}",
            pred.probs.home * 100.0,
            pred.probs.draw * 100.0,
            pred.probs.away * 100.0,
            pred.predicted_score,
            pred.confidence_or_proxy(),
        );
    }

    if let Some(text) = explanation {
        println!("  {text}");
    }
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_str_arg("--db").map(PathBuf::from)
}

fn parse_u32_arg(name: &str) -> Option<u32> {
    parse_str_arg(name)?.parse::<u32>().ok()
}

fn parse_i64_arg(name: &str) -> Option<i64> {
    parse_str_arg(name)?.parse::<i64>().ok()
}

fn parse_str_arg(name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
        {
            let trimmed = next.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
