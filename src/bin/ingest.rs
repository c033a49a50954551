use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use matchcast::config::Config;
use matchcast::http_client::http_client;
use matchcast::stats_fetch;
use matchcast::store;

const DEFAULT_DAYS_BACK: i64 = 120;
const DEFAULT_DAYS_AHEAD: i64 = 14;

fn main() -> Result<()> {
    let cfg = Config::from_env();

    let league_id = parse_u32_arg("--league").unwrap_or(cfg.default_league_id);
    let days_back = parse_i64_arg("--days-back").unwrap_or(DEFAULT_DAYS_BACK).max(0);
    let days_ahead = parse_i64_arg("--days-ahead")
        .unwrap_or(DEFAULT_DAYS_AHEAD)
        .max(0);

    let db_path = parse_db_path_arg()
        .or_else(|| cfg.resolve_db_path())
        .context("unable to resolve sqlite path")?;
    let conn = store::open_db(&db_path)?;

    let now = Utc::now();
    let date_from = (now - Duration::days(days_back)).format("%Y-%m-%d").to_string();
    let date_to = (now + Duration::days(days_ahead)).format("%Y-%m-%d").to_string();

    let client = http_client()?;
    let matches = stats_fetch::fetch_league_matches(client, &cfg, league_id, &date_from, &date_to)?;

    let mut finished = 0usize;
    let mut team_ids = HashSet::new();
    for m in &matches {
        store::upsert_match(&conn, m)?;
        if m.is_finished() {
            finished += 1;
        }
        team_ids.insert(m.home_team_id);
        team_ids.insert(m.away_team_id);
    }

    let mut refreshed = 0usize;
    for team_id in &team_ids {
        store::refresh_team_stats(&conn, *team_id)?;
        refreshed += 1;
    }

    println!("Ingest complete");
    println!("DB: {}", db_path.display());
    println!("League: {league_id}");
    println!("Window: {date_from} .. {date_to}");
    println!("Matches upserted: {} ({finished} finished)", matches.len());
    println!("Team stats refreshed: {refreshed}");

    Ok(())
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
