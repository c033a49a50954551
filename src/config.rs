use std::path::PathBuf;

/// Runtime configuration pulled from the environment. `.env.local` wins over
/// `.env`; every field has a usable default so the offline paths work without
/// any keys.
#[derive(Debug, Clone)]
pub struct Config {
    pub football_api_key: String,
    pub football_api_base_url: String,
    pub news_api_key: String,
    pub news_api_base_url: String,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model: String,
    pub default_league_id: u32,
    pub cache_ttl_secs: u64,
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        Self {
            football_api_key: env_str("FOOTBALL_API_KEY", ""),
            football_api_base_url: env_str(
                "FOOTBALL_API_BASE_URL",
                "https://api.football-data.org/v4",
            ),
            news_api_key: env_str("NEWS_API_KEY", ""),
            news_api_base_url: env_str("NEWS_API_BASE_URL", "https://newsapi.org/v2"),
            llm_api_key: env_str("LLM_API_KEY", ""),
            llm_api_base_url: env_str("LLM_API_BASE_URL", "https://api.openai.com/v1"),
            llm_model: env_str("LLM_MODEL", "gpt-4o-mini"),
            default_league_id: std::env::var("DEFAULT_LEAGUE_ID")
                .ok()
                .and_then(|val| val.parse::<u32>().ok())
                .unwrap_or(2021),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(3600),
            db_path: std::env::var("MATCHCAST_DB_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn resolve_db_path(&self) -> Option<PathBuf> {
        self.db_path
            .clone()
            .or_else(crate::store::default_db_path)
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
