use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::backtest::BacktestRecord;
use crate::features::{TeamAggregates, TeamStatsSource};
use crate::outcome::{OutcomePrediction, Prob3};

/// Recent-result window for the form rating refresh.
const FORM_WINDOW: usize = 5;

/// Passed as a SQL LIMIT when the whole history is wanted.
const NO_LIMIT: usize = i64::MAX as usize;

#[derive(Debug, Clone)]
pub struct StoredMatch {
    pub match_id: i64,
    pub league_id: u32,
    pub utc_time: String,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub status: String,
}

impl StoredMatch {
    pub fn is_finished(&self) -> bool {
        self.status == "FINISHED" && self.home_goals.is_some() && self.away_goals.is_some()
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    crate::http_cache::app_cache_dir().map(|dir| dir.join("matchcast.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            league_id INTEGER NOT NULL,
            utc_time TEXT NOT NULL,
            home_team_id INTEGER NOT NULL,
            away_team_id INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            status TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league_id);
        CREATE INDEX IF NOT EXISTS idx_matches_utc_time ON matches(utc_time);

        CREATE TABLE IF NOT EXISTS team_stats (
            team_id INTEGER PRIMARY KEY,
            matches_played INTEGER NOT NULL,
            wins INTEGER NOT NULL,
            draws INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            goals_for INTEGER NOT NULL,
            goals_against INTEGER NOT NULL,
            form_rating REAL NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS predictions (
            match_id INTEGER NOT NULL,
            model TEXT NOT NULL,
            home_probability REAL NOT NULL,
            draw_probability REAL NOT NULL,
            away_probability REAL NOT NULL,
            predicted_score TEXT NOT NULL,
            confidence REAL NULL,
            narrative TEXT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (match_id, model)
        );

        CREATE TABLE IF NOT EXISTS model_metrics (
            model TEXT NOT NULL,
            metric TEXT NOT NULL,
            value REAL NOT NULL,
            period_start TEXT NOT NULL,
            period_end TEXT NOT NULL,
            sample_size INTEGER NOT NULL,
            calculated_at TEXT NOT NULL,
            PRIMARY KEY (model, metric, period_start, period_end)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_match(conn: &Connection, m: &StoredMatch) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO matches (
            match_id, league_id, utc_time, home_team_id, away_team_id,
            home_team, away_team, home_goals, away_goals, status, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(match_id) DO UPDATE SET
            league_id = excluded.league_id,
            utc_time = excluded.utc_time,
            home_team_id = excluded.home_team_id,
            away_team_id = excluded.away_team_id,
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            status = excluded.status,
            updated_at = excluded.updated_at
        "#,
        params![
            m.match_id,
            m.league_id as i64,
            m.utc_time,
            m.home_team_id as i64,
            m.away_team_id as i64,
            m.home_team,
            m.away_team,
            m.home_goals,
            m.away_goals,
            m.status,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert match")?;
    Ok(())
}

pub fn load_match(conn: &Connection, match_id: i64) -> Result<Option<StoredMatch>> {
    conn.query_row(
        r#"
        SELECT match_id, league_id, utc_time, home_team_id, away_team_id,
               home_team, away_team, home_goals, away_goals, status
        FROM matches WHERE match_id = ?1
        "#,
        params![match_id],
        row_to_match,
    )
    .optional()
    .context("load match")
}

pub fn load_scheduled_matches(
    conn: &Connection,
    league_id: u32,
    until_utc: &str,
) -> Result<Vec<StoredMatch>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT match_id, league_id, utc_time, home_team_id, away_team_id,
                   home_team, away_team, home_goals, away_goals, status
            FROM matches
            WHERE league_id = ?1 AND status = 'SCHEDULED' AND utc_time <= ?2
            ORDER BY utc_time ASC
            "#,
        )
        .context("prepare scheduled matches query")?;

    let rows = stmt
        .query_map(params![league_id as i64, until_utc], row_to_match)
        .context("query scheduled matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

/// Goals the team scored in its recent matches on the given side,
/// most-recent-first.
pub fn load_goal_history(
    conn: &Connection,
    team_id: u32,
    home_side: bool,
    limit: usize,
) -> Result<Vec<u32>> {
    let sql = if home_side {
        "SELECT home_goals FROM matches
         WHERE home_team_id = ?1 AND status = 'FINISHED' AND home_goals IS NOT NULL
         ORDER BY utc_time DESC LIMIT ?2"
    } else {
        "SELECT away_goals FROM matches
         WHERE away_team_id = ?1 AND status = 'FINISHED' AND away_goals IS NOT NULL
         ORDER BY utc_time DESC LIMIT ?2"
    };

    let mut stmt = conn.prepare(sql).context("prepare goal history query")?;
    let rows = stmt
        .query_map(params![team_id as i64, limit as i64], |row| {
            row.get::<_, i64>(0)
        })
        .context("query goal history")?;

    let mut out = Vec::new();
    for row in rows {
        let goals = row.context("decode goal row")?;
        out.push(u32::try_from(goals).unwrap_or(0));
    }
    Ok(out)
}

/// Win/draw/loss sequence for one team across both sides, most-recent-first,
/// encoded 1.0 / 0.5 / 0.0.
pub fn load_result_history(conn: &Connection, team_id: u32, limit: usize) -> Result<Vec<f64>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT home_team_id, home_goals, away_goals FROM matches
            WHERE (home_team_id = ?1 OR away_team_id = ?1)
              AND status = 'FINISHED'
              AND home_goals IS NOT NULL AND away_goals IS NOT NULL
            ORDER BY utc_time DESC LIMIT ?2
            "#,
        )
        .context("prepare result history query")?;

    let rows = stmt
        .query_map(params![team_id as i64, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .context("query result history")?;

    let mut out = Vec::new();
    for row in rows {
        let (home_team_id, home_goals, away_goals) = row.context("decode result row")?;
        let was_home = home_team_id == team_id as i64;
        out.push(result_value(home_goals, away_goals, was_home));
    }
    Ok(out)
}

pub fn result_value(home_goals: i64, away_goals: i64, was_home: bool) -> f64 {
    let (own, other) = if was_home {
        (home_goals, away_goals)
    } else {
        (away_goals, home_goals)
    };
    if own > other {
        1.0
    } else if own == other {
        0.5
    } else {
        0.0
    }
}

pub fn upsert_team_stats(conn: &Connection, team_id: u32, stats: &TeamAggregates) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO team_stats (
            team_id, matches_played, wins, draws, losses,
            goals_for, goals_against, form_rating, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(team_id) DO UPDATE SET
            matches_played = excluded.matches_played,
            wins = excluded.wins,
            draws = excluded.draws,
            losses = excluded.losses,
            goals_for = excluded.goals_for,
            goals_against = excluded.goals_against,
            form_rating = excluded.form_rating,
            updated_at = excluded.updated_at
        "#,
        params![
            team_id as i64,
            stats.matches_played as i64,
            stats.wins as i64,
            stats.draws as i64,
            stats.losses as i64,
            stats.goals_for as i64,
            stats.goals_against as i64,
            stats.form_rating,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert team stats")?;
    Ok(())
}

/// Recompute a team's aggregate row from its stored finished matches.
/// Form rating is the mean result value over the last few matches.
pub fn refresh_team_stats(conn: &Connection, team_id: u32) -> Result<TeamAggregates> {
    let results = load_result_history(conn, team_id, NO_LIMIT)?;

    let mut stats = TeamAggregates {
        matches_played: results.len() as u32,
        ..TeamAggregates::default()
    };
    for r in &results {
        if *r == 1.0 {
            stats.wins += 1;
        } else if *r == 0.5 {
            stats.draws += 1;
        } else {
            stats.losses += 1;
        }
    }

    let recent = &results[..results.len().min(FORM_WINDOW)];
    stats.form_rating = if recent.is_empty() {
        0.5
    } else {
        recent.iter().sum::<f64>() / recent.len() as f64
    };

    let (goals_for, goals_against) = goal_totals(conn, team_id)?;
    stats.goals_for = goals_for;
    stats.goals_against = goals_against;

    upsert_team_stats(conn, team_id, &stats)?;
    Ok(stats)
}

fn goal_totals(conn: &Connection, team_id: u32) -> Result<(u32, u32)> {
    let row = conn
        .query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN home_team_id = ?1 THEN home_goals ELSE away_goals END), 0),
                COALESCE(SUM(CASE WHEN home_team_id = ?1 THEN away_goals ELSE home_goals END), 0)
            FROM matches
            WHERE (home_team_id = ?1 OR away_team_id = ?1)
              AND status = 'FINISHED'
              AND home_goals IS NOT NULL AND away_goals IS NOT NULL
            "#,
            params![team_id as i64],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .context("query goal totals")?;
    Ok((
        u32::try_from(row.0).unwrap_or(0),
        u32::try_from(row.1).unwrap_or(0),
    ))
}

impl TeamStatsSource for Connection {
    fn team_aggregates(&self, team_id: u32) -> Option<TeamAggregates> {
        self.query_row(
            r#"
            SELECT matches_played, wins, draws, losses, goals_for, goals_against, form_rating
            FROM team_stats WHERE team_id = ?1
            "#,
            params![team_id as i64],
            |row| {
                Ok(TeamAggregates {
                    matches_played: row.get::<_, i64>(0)? as u32,
                    wins: row.get::<_, i64>(1)? as u32,
                    draws: row.get::<_, i64>(2)? as u32,
                    losses: row.get::<_, i64>(3)? as u32,
                    goals_for: row.get::<_, i64>(4)? as u32,
                    goals_against: row.get::<_, i64>(5)? as u32,
                    form_rating: row.get(6)?,
                })
            },
        )
        .optional()
        .ok()
        .flatten()
    }
}

pub fn insert_prediction(
    conn: &Connection,
    match_id: i64,
    model: &str,
    prediction: &OutcomePrediction,
    narrative: Option<&str>,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO predictions (
            match_id, model, home_probability, draw_probability, away_probability,
            predicted_score, confidence, narrative, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(match_id, model) DO UPDATE SET
            home_probability = excluded.home_probability,
            draw_probability = excluded.draw_probability,
            away_probability = excluded.away_probability,
            predicted_score = excluded.predicted_score,
            confidence = excluded.confidence,
            narrative = excluded.narrative,
            created_at = excluded.created_at
        "#,
        params![
            match_id,
            model,
            prediction.probs.home,
            prediction.probs.draw,
            prediction.probs.away,
            prediction.predicted_score,
            prediction.confidence,
            narrative,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("insert prediction")?;
    Ok(())
}

/// Join one model's persisted predictions with known final scores inside the
/// window. Matches without both scores are excluded.
pub fn load_backtest_records(
    conn: &Connection,
    model: &str,
    start_utc: &str,
    end_utc: &str,
) -> Result<Vec<BacktestRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT p.home_probability, p.draw_probability, p.away_probability,
                   p.predicted_score, m.home_goals, m.away_goals
            FROM predictions p
            JOIN matches m ON p.match_id = m.match_id
            WHERE p.model = ?1
              AND m.utc_time BETWEEN ?2 AND ?3
              AND m.home_goals IS NOT NULL AND m.away_goals IS NOT NULL
            ORDER BY m.utc_time ASC
            "#,
        )
        .context("prepare backtest join")?;

    let rows = stmt
        .query_map(params![model, start_utc, end_utc], |row| {
            Ok(BacktestRecord {
                probs: Prob3 {
                    home: row.get(0)?,
                    draw: row.get(1)?,
                    away: row.get(2)?,
                },
                predicted_score: row.get(3)?,
                home_goals: row.get::<_, i64>(4)? as i32,
                away_goals: row.get::<_, i64>(5)? as i32,
            })
        })
        .context("query backtest records")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode backtest row")?);
    }
    Ok(out)
}

/// Write one metric row; the (model, metric, period) key is overwritten on
/// repeat runs.
pub fn save_metric(
    conn: &Connection,
    model: &str,
    metric: &str,
    value: f64,
    period_start: &str,
    period_end: &str,
    sample_size: usize,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO model_metrics (
            model, metric, value, period_start, period_end, sample_size, calculated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            model,
            metric,
            value,
            period_start,
            period_end,
            sample_size as i64,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("save model metric")?;
    Ok(())
}

pub fn load_metric(
    conn: &Connection,
    model: &str,
    metric: &str,
    period_start: &str,
    period_end: &str,
) -> Result<Option<(f64, usize)>> {
    conn.query_row(
        r#"
        SELECT value, sample_size FROM model_metrics
        WHERE model = ?1 AND metric = ?2 AND period_start = ?3 AND period_end = ?4
        "#,
        params![model, metric, period_start, period_end],
        |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as usize)),
    )
    .optional()
    .context("load model metric")
}

fn row_to_match(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMatch> {
    Ok(StoredMatch {
        match_id: row.get(0)?,
        league_id: row.get::<_, i64>(1)? as u32,
        utc_time: row.get(2)?,
        home_team_id: row.get::<_, i64>(3)? as u32,
        away_team_id: row.get::<_, i64>(4)? as u32,
        home_team: row.get(5)?,
        away_team: row.get(6)?,
        home_goals: row.get::<_, Option<i64>>(7)?.map(|g| g as i32),
        away_goals: row.get::<_, Option<i64>>(8)?.map(|g| g as i32),
        status: row.get(9)?,
    })
}
