use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::config::Config;
use crate::outcome::OutcomePrediction;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 200;

/// One-paragraph explanation of a prediction. Uses the chat completion
/// endpoint when a key is configured; otherwise (or on any API failure)
/// falls back to a deterministic template so reports never block on the
/// collaborator.
pub fn explain_prediction(
    client: &Client,
    cfg: &Config,
    home_team: &str,
    away_team: &str,
    prediction: &OutcomePrediction,
) -> String {
    if cfg.llm_api_key.is_empty() {
        return template_explanation(home_team, away_team, prediction);
    }
    request_explanation(client, cfg, home_team, away_team, prediction)
        .unwrap_or_else(|_| template_explanation(home_team, away_team, prediction))
}

fn request_explanation(
    client: &Client,
    cfg: &Config,
    home_team: &str,
    away_team: &str,
    prediction: &OutcomePrediction,
) -> Result<String> {
    let url = format!("{}/chat/completions", cfg.llm_api_base_url);
    let prompt = format!(
        "Explain this football prediction in one short paragraph for a fan. \
         {home_team} vs {away_team}. Win probabilities: home {:.0}%, draw {:.0}%, away {:.0}%. \
         Most likely score: {}.",
        prediction.probs.home * 100.0,
        prediction.probs.draw * 100.0,
        prediction.probs.away * 100.0,
        prediction.predicted_score,
    );
    let body = json!({
        "model": cfg.llm_model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
    });

    let resp = client
        .post(&url)
        .bearer_auth(&cfg.llm_api_key)
        .json(&body)
        .send()
        .context("chat completion request failed")?;
    let status = resp.status();
    let raw = resp.text().context("failed reading chat completion body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, raw));
    }
    parse_completion(&raw)
}

fn parse_completion(raw: &str) -> Result<String> {
    let value = serde_json::from_str::<Value>(raw).context("invalid chat completion json")?;
    let content = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .context("missing completion content")?
        .trim()
        .to_string();
    if content.is_empty() {
        return Err(anyhow::anyhow!("empty completion content"));
    }
    Ok(content)
}

fn template_explanation(
    home_team: &str,
    away_team: &str,
    prediction: &OutcomePrediction,
) -> String {
    let probs = &prediction.probs;
    let (favourite, chance) = if probs.home >= probs.away && probs.home >= probs.draw {
        (format!("{home_team} to win"), probs.home)
    } else if probs.away >= probs.draw {
        (format!("{away_team} to win"), probs.away)
    } else {
        ("a draw".to_string(), probs.draw)
    };
    format!(
        "The model leans towards {favourite} at {:.0}% (home {:.0}%, draw {:.0}%, away {:.0}%), \
         with {} the most likely scoreline.",
        chance * 100.0,
        probs.home * 100.0,
        probs.draw * 100.0,
        probs.away * 100.0,
        prediction.predicted_score,
    )
}
