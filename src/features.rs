/// Fixed multiplicative home advantage applied by the builder.
pub const HOME_ADVANTAGE: f64 = 1.05;

/// Per-team aggregates supplied by the match/team data collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamAggregates {
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub form_rating: f64,
}

/// Source of per-team aggregate stats (goals for/against, form rating).
pub trait TeamStatsSource {
    fn team_aggregates(&self, team_id: u32) -> Option<TeamAggregates>;
}

/// Source of a scalar sentiment value in [0,1] per team.
pub trait SentimentSource {
    fn team_sentiment(&self, team_name: &str) -> Option<f64>;
}

/// Normalized model inputs. Built fresh per prediction request and never
/// mutated afterwards; missing upstream signals land on neutral values so
/// models never see undefined inputs.
#[derive(Debug, Clone, Copy)]
pub struct FeatureVector {
    pub home_form: f64,
    pub away_form: f64,
    pub home_attack_strength: f64,
    pub home_defense_strength: f64,
    pub away_attack_strength: f64,
    pub away_defense_strength: f64,
    pub home_advantage: f64,
    pub home_news_sentiment: f64,
    pub away_news_sentiment: f64,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            home_form: 0.5,
            away_form: 0.5,
            home_attack_strength: 1.0,
            home_defense_strength: 1.0,
            away_attack_strength: 1.0,
            away_defense_strength: 1.0,
            home_advantage: HOME_ADVANTAGE,
            home_news_sentiment: 0.5,
            away_news_sentiment: 0.5,
        }
    }
}

pub fn build_features(
    home_team_id: u32,
    away_team_id: u32,
    home_team_name: &str,
    away_team_name: &str,
    use_news: bool,
    stats: &impl TeamStatsSource,
    sentiment: &impl SentimentSource,
) -> FeatureVector {
    let home = stats.team_aggregates(home_team_id).unwrap_or_default();
    let away = stats.team_aggregates(away_team_id).unwrap_or_default();

    let mut features = FeatureVector {
        home_form: form_or_neutral(home.form_rating, home.matches_played),
        away_form: form_or_neutral(away.form_rating, away.matches_played),
        home_attack_strength: attack_strength(home.goals_for),
        home_defense_strength: defense_strength(home.goals_against),
        away_attack_strength: attack_strength(away.goals_for),
        away_defense_strength: defense_strength(away.goals_against),
        ..FeatureVector::default()
    };

    if use_news {
        features.home_news_sentiment = sentiment.team_sentiment(home_team_name).unwrap_or(0.5);
        features.away_news_sentiment = sentiment.team_sentiment(away_team_name).unwrap_or(0.5);
    }

    features
}

fn form_or_neutral(form_rating: f64, matches_played: u32) -> f64 {
    if matches_played == 0 || !form_rating.is_finite() {
        0.5
    } else {
        form_rating.clamp(0.0, 1.0)
    }
}

// Season goal totals map to multiplicative factors centered at 1.0; the /30
// scale keeps a typical season tally inside roughly [0.5, 2.0].
fn attack_strength(goals_for: u32) -> f64 {
    if goals_for > 0 {
        1.0 + goals_for as f64 / 30.0
    } else {
        1.0
    }
}

fn defense_strength(goals_against: u32) -> f64 {
    if goals_against > 0 {
        1.0 - goals_against as f64 / 30.0
    } else {
        1.0
    }
}
