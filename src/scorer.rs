//! scorer.rs — rubric scoring engine.
//!
//! `score()` is a pure function of (signal, rubric weights, thresholds):
//! same input, same configuration, bit-identical total and action. Each of
//! the six dimensions starts from a fixed base, adds 1 per distinct keyword
//! found in the lowercased title+description+tags blob, and clamps to [1, 5].

use crate::config::{RubricConfig, ThresholdConfig};
use crate::signal::{ActionType, RubricScores, ScoredSignal, Signal};

const PAIN_KEYWORDS: &[&str] = &["pain", "manual", "slow", "error", "broken", "waste", "overhead"];
const URGENCY_KEYWORDS: &[&str] = &["urgent", "critical", "must-have"];
const ROI_KEYWORDS: &[&str] = &[
    "save",
    "revenue",
    "profit",
    "cost",
    "efficiency",
    "productivity",
    "pipeline",
];
const AUTO_FIT_KEYWORDS: &[&str] = &[
    "agent",
    "automation",
    "workflow",
    "llm",
    "ai",
    "autonomous",
    "integration",
];
const DEFENSIBILITY_KEYWORDS: &[&str] = &[
    "vertical",
    "domain",
    "compliance",
    "data",
    "network effect",
    "proprietary",
];
const DISTRIBUTION_KEYWORDS: &[&str] = &[
    "smb",
    "small business",
    "ops",
    "service business",
    "agency",
    "sales",
];
const SPEED_KEYWORDS: &[&str] = &["template", "sdk", "api", "no-code", "quickstart", "starter"];

// Engagement levels that grant the ROI boost, per metric.
const BOOST_STARS: u64 = 100;
const BOOST_COMMENTS: u64 = 30;
const BOOST_VIEWS: u64 = 10_000;

/// Classify a weighted total against the descending threshold ladder.
/// Scanned from the highest action down; ties go to the higher action.
pub fn action_for_total(thresholds: &ThresholdConfig, total: f64) -> ActionType {
    if total >= thresholds.alert {
        ActionType::Alert
    } else if total >= thresholds.asset {
        ActionType::Asset
    } else if total >= thresholds.content {
        ActionType::Content
    } else if total >= thresholds.research {
        ActionType::Research
    } else {
        ActionType::Log
    }
}

pub struct SignalScorer {
    rubric: RubricConfig,
    thresholds: ThresholdConfig,
}

impl SignalScorer {
    pub fn new(rubric: RubricConfig, thresholds: ThresholdConfig) -> Self {
        Self { rubric, thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn score(&self, signal: &Signal) -> ScoredSignal {
        let text = format!(
            "{} {} {}",
            signal.title.as_deref().unwrap_or_default(),
            signal.description.as_deref().unwrap_or_default(),
            signal.tags.join(" ")
        )
        .to_lowercase();

        let scores = RubricScores {
            pain: clamp(2 + keyword_hits(&text, PAIN_KEYWORDS) + keyword_hits(&text, URGENCY_KEYWORDS)),
            roi: clamp(2 + keyword_hits(&text, ROI_KEYWORDS) + engagement_boost(signal)),
            auto_fit: clamp(1 + keyword_hits(&text, AUTO_FIT_KEYWORDS)),
            defensibility: clamp(1 + keyword_hits(&text, DEFENSIBILITY_KEYWORDS)),
            distribution: clamp(1 + keyword_hits(&text, DISTRIBUTION_KEYWORDS)),
            speed: clamp(2 + keyword_hits(&text, SPEED_KEYWORDS)),
        };

        let total_score = self.weighted_total(&scores);
        let action = action_for_total(&self.thresholds, total_score);
        let priority = action.priority();

        let reasoning = format!(
            "Pain {}/5 | ROI {}/5 | Automation fit {}/5 | Defensibility {}/5 | Distribution {}/5 | Speed {}/5 | => {:.1} ({})",
            scores.pain,
            scores.roi,
            scores.auto_fit,
            scores.defensibility,
            scores.distribution,
            scores.speed,
            total_score,
            action,
        );

        ScoredSignal {
            signal: signal.clone(),
            scores,
            total_score,
            action,
            priority,
            reasoning,
        }
    }

    /// `sum((dimension/5) * weight)`, clamped to [0, 45], 2 decimal places.
    fn weighted_total(&self, scores: &RubricScores) -> f64 {
        let total = f64::from(scores.pain) / 5.0 * f64::from(self.rubric.pain.weight)
            + f64::from(scores.roi) / 5.0 * f64::from(self.rubric.roi.weight)
            + f64::from(scores.auto_fit) / 5.0 * f64::from(self.rubric.auto_fit.weight)
            + f64::from(scores.defensibility) / 5.0 * f64::from(self.rubric.defensibility.weight)
            + f64::from(scores.distribution) / 5.0 * f64::from(self.rubric.distribution.weight)
            + f64::from(scores.speed) / 5.0 * f64::from(self.rubric.speed.weight);

        ((total * 100.0).round() / 100.0).clamp(0.0, 45.0)
    }
}

fn keyword_hits(text: &str, words: &[&str]) -> u8 {
    words.iter().filter(|w| text.contains(*w)).count() as u8
}

fn engagement_boost(signal: &Signal) -> u8 {
    let Some(e) = &signal.engagement else {
        return 0;
    };
    let boosted = e.stars.unwrap_or(0) >= BOOST_STARS
        || e.comments.unwrap_or(0) >= BOOST_COMMENTS
        || e.views.unwrap_or(0) >= BOOST_VIEWS;
    u8::from(boosted)
}

fn clamp(score: u8) -> u8 {
    score.clamp(1, 5)
}
