use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::Config;
use crate::http_cache::fetch_json_cached;
use crate::store::StoredMatch;

/// List a competition's matches inside a date window (both finished and
/// scheduled); the payload carries final scores for finished rows.
pub fn fetch_league_matches(
    client: &Client,
    cfg: &Config,
    league_id: u32,
    date_from: &str,
    date_to: &str,
) -> Result<Vec<StoredMatch>> {
    let url = format!(
        "{}/competitions/{league_id}/matches?dateFrom={date_from}&dateTo={date_to}",
        cfg.football_api_base_url
    );
    let headers: Vec<(&str, &str)> = if cfg.football_api_key.is_empty() {
        Vec::new()
    } else {
        vec![("X-Auth-Token", cfg.football_api_key.as_str())]
    };
    let body = fetch_json_cached(client, &url, &headers, cfg.cache_ttl_secs)
        .context("fetch league matches failed")?;
    parse_matches_json(&body, league_id)
}

pub fn parse_matches_json(raw: &str, fallback_league_id: u32) -> Result<Vec<StoredMatch>> {
    let value =
        serde_json::from_str::<Value>(raw.trim()).context("invalid league matches json")?;
    let matches = value
        .get("matches")
        .and_then(|v| v.as_array())
        .context("missing matches array")?;

    let mut out = Vec::with_capacity(matches.len());
    for m in matches {
        if let Some(row) = parse_match(m, fallback_league_id) {
            out.push(row);
        }
    }
    Ok(out)
}

fn parse_match(v: &Value, fallback_league_id: u32) -> Option<StoredMatch> {
    let match_id = as_i64_any(v.get("id")?)?;
    let league_id = v
        .get("competition")
        .and_then(|c| c.get("id"))
        .and_then(as_u32_any)
        .unwrap_or(fallback_league_id);
    let utc_time = v.get("utcDate")?.as_str()?.to_string();
    let status = normalize_status(v.get("status").and_then(|s| s.as_str()).unwrap_or(""));

    let home = v.get("homeTeam")?;
    let away = v.get("awayTeam")?;
    let home_team_id = as_u32_any(home.get("id")?)?;
    let away_team_id = as_u32_any(away.get("id")?)?;
    let home_team = team_name(home)?;
    let away_team = team_name(away)?;

    let full_time = v.get("score").and_then(|s| s.get("fullTime"));
    let home_goals = full_time
        .and_then(|ft| ft.get("home"))
        .and_then(as_i64_any)
        .map(|g| g as i32);
    let away_goals = full_time
        .and_then(|ft| ft.get("away"))
        .and_then(as_i64_any)
        .map(|g| g as i32);

    Some(StoredMatch {
        match_id,
        league_id,
        utc_time,
        home_team_id,
        away_team_id,
        home_team,
        away_team,
        home_goals,
        away_goals,
        status,
    })
}

fn team_name(team: &Value) -> Option<String> {
    let name = team
        .get("name")
        .and_then(|x| x.as_str())
        .or_else(|| team.get("shortName").and_then(|x| x.as_str()))?
        .to_string();
    if name.is_empty() { None } else { Some(name) }
}

// The upstream uses several pre-kickoff statuses; anything not yet played is
// a scheduled match for our purposes.
fn normalize_status(raw: &str) -> String {
    match raw {
        "FINISHED" => "FINISHED".to_string(),
        "SCHEDULED" | "TIMED" | "POSTPONED" | "" => "SCHEDULED".to_string(),
        other => other.to_string(),
    }
}

fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    let n = as_i64_any(v)?;
    u32::try_from(n).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHES_JSON: &str = r#"{
        "matches": [
            {
                "id": 101,
                "utcDate": "2025-08-01T14:00:00Z",
                "status": "FINISHED",
                "competition": {"id": 2021},
                "homeTeam": {"id": 1, "name": "Reds"},
                "awayTeam": {"id": 2, "name": "Blues"},
                "score": {"fullTime": {"home": 2, "away": 1}}
            },
            {
                "id": 102,
                "utcDate": "2025-08-09T14:00:00Z",
                "status": "TIMED",
                "homeTeam": {"id": 2, "name": "Blues"},
                "awayTeam": {"id": 1, "name": "Reds"},
                "score": {"fullTime": {"home": null, "away": null}}
            }
        ]
    }"#;

    #[test]
    fn parses_finished_and_scheduled_rows() {
        let rows = parse_matches_json(MATCHES_JSON, 2021).expect("payload should parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].match_id, 101);
        assert_eq!(rows[0].status, "FINISHED");
        assert_eq!(rows[0].home_goals, Some(2));
        assert_eq!(rows[1].status, "SCHEDULED");
        assert_eq!(rows[1].home_goals, None);
        assert_eq!(rows[1].league_id, 2021);
    }

    #[test]
    fn rows_missing_teams_are_dropped() {
        let raw = r#"{"matches": [{"id": 1, "utcDate": "2025-01-01T00:00:00Z"}]}"#;
        let rows = parse_matches_json(raw, 1).unwrap();
        assert!(rows.is_empty());
    }
}
