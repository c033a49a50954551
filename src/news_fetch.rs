use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::Config;
use crate::features::SentimentSource;
use crate::http_cache::fetch_json_cached;

const ARTICLE_PAGE_SIZE: u32 = 20;
const LOOKBACK_DAYS: i64 = 7;
const NEUTRAL_SENTIMENT: f64 = 0.5;

const POSITIVE_KEYWORDS: [&str; 6] = ["win", "victory", "strong", "excellent", "brilliant", "great"];
const NEGATIVE_KEYWORDS: [&str; 6] = ["loss", "defeat", "poor", "weak", "injured", "suspension"];

#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub description: String,
}

/// Recent articles mentioning a team, newest first.
pub fn fetch_team_news(client: &Client, cfg: &Config, team_name: &str) -> Result<Vec<Article>> {
    let from = (Utc::now() - Duration::days(LOOKBACK_DAYS))
        .format("%Y-%m-%d")
        .to_string();
    let query: String = team_name
        .chars()
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    let url = format!(
        "{}/everything?q={query}&from={from}&language=en&sortBy=publishedAt&pageSize={ARTICLE_PAGE_SIZE}&apiKey={}",
        cfg.news_api_base_url, cfg.news_api_key
    );
    let body =
        fetch_json_cached(client, &url, &[], cfg.cache_ttl_secs).context("fetch news failed")?;
    parse_articles_json(&body)
}

pub fn parse_articles_json(raw: &str) -> Result<Vec<Article>> {
    let value = serde_json::from_str::<Value>(raw.trim()).context("invalid news json")?;
    let articles = value
        .get("articles")
        .and_then(|v| v.as_array())
        .context("missing articles array")?;

    Ok(articles
        .iter()
        .filter_map(|a| {
            let title = a.get("title")?.as_str()?.to_string();
            let description = a
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("")
                .to_string();
            Some(Article { title, description })
        })
        .collect())
}

/// Keyword-count sentiment in [0, 1]; 0.5 means neutral or no signal.
pub fn analyze_sentiment(articles: &[Article]) -> f64 {
    let mut positive = 0usize;
    let mut negative = 0usize;
    for article in articles {
        let text = format!("{} {}", article.title, article.description).to_lowercase();
        positive += POSITIVE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
        negative += NEGATIVE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
    }
    let total = positive + negative;
    if total == 0 {
        return NEUTRAL_SENTIMENT;
    }
    positive as f64 / total as f64
}

/// Live sentiment source backed by the news endpoint. Missing key or fetch
/// errors yield `None` so feature building falls back to neutral.
pub struct NewsSentimentSource<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> NewsSentimentSource<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }
}

impl SentimentSource for NewsSentimentSource<'_> {
    fn team_sentiment(&self, team_name: &str) -> Option<f64> {
        if self.cfg.news_api_key.is_empty() {
            return None;
        }
        let articles = fetch_team_news(self.client, self.cfg, team_name).ok()?;
        if articles.is_empty() {
            return None;
        }
        Some(analyze_sentiment(&articles))
    }
}
