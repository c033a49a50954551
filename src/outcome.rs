use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

/// Probability triple over the three match outcomes. Producers keep it
/// normalized; consumers may re-normalize after arithmetic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    /// Neutral default used when a model cannot produce a distribution
    /// (slight draw lean so the triple sums to exactly 1).
    pub fn neutral() -> Self {
        Self {
            home: 0.33,
            draw: 0.34,
            away: 0.33,
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    pub fn normalized(self) -> Self {
        let sum = self.sum();
        if sum > 0.0 {
            Self {
                home: self.home / sum,
                draw: self.draw / sum,
                away: self.away / sum,
            }
        } else {
            Self::uniform()
        }
    }

    pub fn max_prob(&self) -> f64 {
        self.home.max(self.draw).max(self.away)
    }

    /// Most likely outcome; ties resolve home, then draw, then away.
    pub fn argmax(&self) -> Outcome {
        if self.home >= self.draw && self.home >= self.away {
            Outcome::Home
        } else if self.draw >= self.away {
            Outcome::Draw
        } else {
            Outcome::Away
        }
    }
}

pub fn classify_outcome(home_goals: i32, away_goals: i32) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

pub fn one_hot(outcome: Outcome) -> Prob3 {
    match outcome {
        Outcome::Home => Prob3 {
            home: 1.0,
            draw: 0.0,
            away: 0.0,
        },
        Outcome::Draw => Prob3 {
            home: 0.0,
            draw: 1.0,
            away: 0.0,
        },
        Outcome::Away => Prob3 {
            home: 0.0,
            draw: 0.0,
            away: 1.0,
        },
    }
}

/// Per-model diagnostics carried alongside the outcome distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelDetails {
    Poisson {
        home_lambda: f64,
        away_lambda: f64,
    },
    NegativeBinomial {
        home_mu: f64,
        away_mu: f64,
        home_alpha: f64,
        away_alpha: f64,
    },
    Hawkes {
        base_home: f64,
        base_away: f64,
        simulated_home: Vec<u32>,
        simulated_away: Vec<u32>,
    },
    Form {
        home_state: usize,
        away_state: usize,
        prior: [f64; 3],
    },
    Ensemble {
        weights: Vec<(String, f64)>,
    },
}

/// Canonical output of every scoring model and of the combiner.
/// Immutable once constructed; the combiner only reads its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomePrediction {
    pub probs: Prob3,
    pub predicted_score: String,
    pub confidence: Option<f64>,
    pub details: ModelDetails,
}

impl OutcomePrediction {
    /// Confidence if set, otherwise the maximum outcome probability as a proxy.
    pub fn confidence_or_proxy(&self) -> f64 {
        self.confidence.unwrap_or_else(|| self.probs.max_prob())
    }
}

/// Sum the joint mass of two independent per-side score distributions into
/// the three outcome buckets, then renormalize. The pmfs cover scores
/// `0..pmf.len()`; truncated tail mass is absorbed by the renormalization.
pub fn score_grid_probs(pmf_home: &[f64], pmf_away: &[f64]) -> Prob3 {
    let mut home = 0.0;
    let mut draw = 0.0;
    let mut away = 0.0;

    for (h, p_h) in pmf_home.iter().enumerate() {
        for (a, p_a) in pmf_away.iter().enumerate() {
            let p = p_h * p_a;
            if h > a {
                home += p;
            } else if h == a {
                draw += p;
            } else {
                away += p;
            }
        }
    }

    Prob3 { home, draw, away }.normalized()
}

pub fn format_score(home: u32, away: u32) -> String {
    format!("{home}-{away}")
}

/// Lenient "H-A" parse: any non-digit run separates the two numbers.
pub fn parse_score_pair(raw: &str) -> Option<(u32, u32)> {
    let mut nums = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let home = nums.next()?;
    let away = nums.next()?;
    Some((home, away))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_score_pair_works() {
        assert_eq!(parse_score_pair("2-1"), Some((2, 1)));
        assert_eq!(parse_score_pair(" 0 : 0 "), Some((0, 0)));
        assert_eq!(parse_score_pair("ab"), None);
        assert_eq!(parse_score_pair("3"), None);
    }

    #[test]
    fn argmax_prefers_home_then_draw_on_ties() {
        let even = Prob3::uniform();
        assert_eq!(even.argmax(), Outcome::Home);
        let draw_tie = Prob3 {
            home: 0.2,
            draw: 0.4,
            away: 0.4,
        };
        assert_eq!(draw_tie.argmax(), Outcome::Draw);
    }

    #[test]
    fn normalized_handles_zero_mass() {
        let zero = Prob3 {
            home: 0.0,
            draw: 0.0,
            away: 0.0,
        };
        let p = zero.normalized();
        assert!((p.sum() - 1.0).abs() < 1e-12);
    }
}
