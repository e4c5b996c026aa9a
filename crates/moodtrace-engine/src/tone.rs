//! Response-tone selection by rule scoring
//!
//! Each profile carries a list of threshold conditions over sentiment
//! axes and derived metrics. A satisfied condition adds its credit to the
//! profile's score; the highest score wins and ties go to the profile
//! declared first. Profiles can be supplied as YAML in the same shape as
//! the built-in table.

use moodtrace_core::{ConversationResult, Result, Sentiment, Trajectory};
use serde::{Deserialize, Serialize};

/// Credit for a satisfied metric condition
pub const METRIC_CREDIT: f64 = 0.4;

/// Credit for a satisfied valence-sign condition
pub const VALENCE_CREDIT: f64 = 0.3;

/// Extra credit a matching conversation trajectory adds
pub const TRAJECTORY_CREDIT: f64 = 0.3;

/// Quantity a tone condition is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Valence,
    AbsValence,
    Arousal,
    Dominance,
    Frustration,
    Satisfaction,
    Confusion,
}

impl Metric {
    pub fn of(&self, sentiment: &Sentiment) -> f64 {
        match self {
            Self::Valence => sentiment.valence,
            Self::AbsValence => sentiment.valence.abs(),
            Self::Arousal => sentiment.arousal,
            Self::Dominance => sentiment.dominance,
            Self::Frustration => sentiment.frustration(),
            Self::Satisfaction => sentiment.satisfaction(),
            Self::Confusion => sentiment.confusion(),
        }
    }
}

/// A single scored condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ToneCondition {
    /// metric >= threshold
    AtLeast {
        metric: Metric,
        threshold: f64,
        /// Defaults to the metric's standard credit
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credit: Option<f64>,
    },

    /// metric <= threshold
    AtMost {
        metric: Metric,
        threshold: f64,
        /// Defaults to the metric's standard credit
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credit: Option<f64>,
    },
}

impl ToneCondition {
    fn at_least(metric: Metric, threshold: f64) -> Self {
        Self::AtLeast {
            metric,
            threshold,
            credit: None,
        }
    }

    fn at_most(metric: Metric, threshold: f64) -> Self {
        Self::AtMost {
            metric,
            threshold,
            credit: None,
        }
    }

    /// Credit earned against `sentiment` (zero when unsatisfied)
    pub fn credit(&self, sentiment: &Sentiment) -> f64 {
        match self {
            Self::AtLeast {
                metric,
                threshold,
                credit,
            } if metric.of(sentiment) >= *threshold => {
                credit.unwrap_or_else(|| credit_for(*metric))
            }
            Self::AtMost {
                metric,
                threshold,
                credit,
            } if metric.of(sentiment) <= *threshold => {
                credit.unwrap_or_else(|| credit_for(*metric))
            }
            _ => 0.0,
        }
    }
}

fn credit_for(metric: Metric) -> f64 {
    match metric {
        Metric::Valence | Metric::AbsValence => VALENCE_CREDIT,
        _ => METRIC_CREDIT,
    }
}

/// A named response tone and the conditions that favour it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneRule {
    pub name: String,
    pub description: String,

    /// Suggested response strategies, in priority order
    #[serde(default)]
    pub strategies: Vec<String>,

    #[serde(default)]
    pub conditions: Vec<ToneCondition>,

    /// Score granted regardless of conditions
    #[serde(default)]
    pub base_score: f64,

    /// Trajectory that earns extra credit in conversation mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favoured_trajectory: Option<Trajectory>,
}

impl ToneRule {
    /// Score this rule against a sentiment
    pub fn score(&self, sentiment: &Sentiment) -> f64 {
        self.base_score
            + self
                .conditions
                .iter()
                .map(|c| c.credit(sentiment))
                .sum::<f64>()
    }
}

/// The selected tone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneProfile {
    pub name: String,
    pub tone_description: String,
    pub strategies: Vec<String>,
    pub match_score: f64,
}

/// Picks a response tone from a fixed, ordered rule table
#[derive(Debug, Clone)]
pub struct ToneSelector {
    rules: Vec<ToneRule>,
}

impl ToneSelector {
    /// Selector over the built-in profile table
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Selector over custom rules; falls back to the built-in table when empty
    pub fn with_rules(rules: Vec<ToneRule>) -> Self {
        if rules.is_empty() {
            Self::new()
        } else {
            Self { rules }
        }
    }

    /// Load rules from a YAML list
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let rules: Vec<ToneRule> = serde_yaml::from_str(yaml).map_err(|e| {
            moodtrace_core::Error::config(format!("Failed to parse tone profiles: {e}"))
        })?;
        Ok(Self::with_rules(rules))
    }

    pub fn rules(&self) -> &[ToneRule] {
        &self.rules
    }

    /// Best tone for a single sentiment
    pub fn select_tone(&self, sentiment: &Sentiment) -> ToneProfile {
        self.select(|rule| rule.score(sentiment))
    }

    /// Best tone for a conversation: scored on the overall sentiment, with
    /// extra credit for profiles favouring the observed trajectory
    pub fn select_tone_for_conversation(&self, result: &ConversationResult) -> ToneProfile {
        self.select(|rule| {
            let bonus = match rule.favoured_trajectory {
                Some(t) if t == result.trajectory => TRAJECTORY_CREDIT,
                _ => 0.0,
            };
            rule.score(&result.overall) + bonus
        })
    }

    fn select(&self, score: impl Fn(&ToneRule) -> f64) -> ToneProfile {
        let mut best: Option<(&ToneRule, f64)> = None;
        for rule in &self.rules {
            let s = score(rule);
            // Strictly greater keeps the earlier rule on ties
            if best.map_or(true, |(_, top)| s > top) {
                best = Some((rule, s));
            }
        }

        match best {
            Some((rule, match_score)) => ToneProfile {
                name: rule.name.clone(),
                tone_description: rule.description.clone(),
                strategies: rule.strategies.clone(),
                match_score,
            },
            None => neutral_profile(0.5),
        }
    }
}

impl Default for ToneSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn neutral_profile(match_score: f64) -> ToneProfile {
    ToneProfile {
        name: "neutral_professional".to_string(),
        tone_description: "Clear, courteous, and matter-of-fact".to_string(),
        strategies: vec![
            "answer directly".to_string(),
            "keep a balanced register".to_string(),
        ],
        match_score,
    }
}

fn strategies(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The built-in profile table, in declaration (tie-break) order
pub fn default_rules() -> Vec<ToneRule> {
    use Metric::*;

    let neutral = neutral_profile(0.5);
    vec![
        ToneRule {
            name: "empathetic_supportive".to_string(),
            description: "Warm and validating; acknowledge the difficulty before solving"
                .to_string(),
            strategies: strategies(&[
                "acknowledge the frustration explicitly",
                "apologise for the inconvenience where appropriate",
                "offer a concrete next step",
                "avoid blame and jargon",
            ]),
            conditions: vec![
                ToneCondition::at_least(Frustration, 0.5),
                ToneCondition::at_least(Arousal, 0.6),
                ToneCondition::at_most(Valence, -0.3),
            ],
            base_score: 0.0,
            favoured_trajectory: Some(Trajectory::Declining),
        },
        ToneRule {
            name: "patient_explanatory".to_string(),
            description: "Slow and structured; explain step by step".to_string(),
            strategies: strategies(&[
                "break the answer into small steps",
                "check understanding",
                "use a simple example",
            ]),
            conditions: vec![
                ToneCondition::at_least(Confusion, 0.3),
                ToneCondition::at_most(Dominance, 0.4),
                ToneCondition::at_most(AbsValence, 0.3),
            ],
            base_score: 0.0,
            favoured_trajectory: None,
        },
        ToneRule {
            name: "enthusiastic_celebratory".to_string(),
            description: "Upbeat; share in the user's success".to_string(),
            strategies: strategies(&[
                "celebrate the result",
                "reinforce what worked",
                "suggest a natural next goal",
            ]),
            conditions: vec![
                ToneCondition::at_least(Satisfaction, 0.3),
                ToneCondition::at_least(Arousal, 0.5),
                ToneCondition::at_least(Valence, 0.5),
            ],
            base_score: 0.0,
            favoured_trajectory: Some(Trajectory::Improving),
        },
        ToneRule {
            name: "calm_reassuring".to_string(),
            description: "Steady and grounding; lower the temperature".to_string(),
            strategies: strategies(&[
                "slow the pace",
                "state what is known and under control",
                "offer reassurance without dismissing concerns",
            ]),
            conditions: vec![
                ToneCondition::at_least(Arousal, 0.7),
                ToneCondition::at_most(Dominance, 0.2),
                ToneCondition::at_most(Valence, 0.0),
            ],
            base_score: 0.0,
            favoured_trajectory: None,
        },
        ToneRule {
            name: "direct_efficient".to_string(),
            description: "Brief and action-oriented".to_string(),
            strategies: strategies(&[
                "lead with the answer",
                "skip pleasantries",
                "list concrete actions",
            ]),
            conditions: vec![
                ToneCondition::at_least(Dominance, 0.6),
                ToneCondition::at_most(Arousal, 0.5),
                ToneCondition::at_least(Valence, -0.2),
            ],
            base_score: 0.0,
            favoured_trajectory: None,
        },
        ToneRule {
            name: neutral.name,
            description: neutral.tone_description,
            strategies: neutral.strategies,
            conditions: Vec::new(),
            base_score: neutral.match_score,
            favoured_trajectory: None,
        },
    ]
}
