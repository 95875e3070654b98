//! signal.rs — normalized data model shared by monitors, scorer, router and storage.
//!
//! Everything persisted to disk (cache entries, queue entries, the run summary)
//! serializes with camelCase field names so the JSONL logs stay stable across
//! versions and readable by external triage tooling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed enumeration of external sources. The variant name doubles as the
/// id namespace prefix (`github:123`), so collisions across sources are
/// impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Github,
    Hackernews,
    Youtube,
    Twitter,
}

impl SignalSource {
    pub const ALL: [SignalSource; 4] = [
        SignalSource::Github,
        SignalSource::Hackernews,
        SignalSource::Youtube,
        SignalSource::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::Github => "github",
            SignalSource::Hackernews => "hackernews",
            SignalSource::Youtube => "youtube",
            SignalSource::Twitter => "twitter",
        }
    }

    /// Parse a CLI-supplied source name. `None` for anything unknown; the
    /// caller decides whether that is fatal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "github" => Some(SignalSource::Github),
            "hackernews" => Some(SignalSource::Hackernews),
            "youtube" => Some(SignalSource::Youtube),
            "twitter" => Some(SignalSource::Twitter),
            _ => None,
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency classification derived from the weighted total, ordered by
/// descending urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Alert,
    Asset,
    Content,
    Research,
    Log,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Alert => "alert",
            ActionType::Asset => "asset",
            ActionType::Content => "content",
            ActionType::Research => "research",
            ActionType::Log => "log",
        }
    }

    pub fn priority(&self) -> PriorityLevel {
        match self {
            ActionType::Alert | ActionType::Asset => PriorityLevel::High,
            ActionType::Content | ActionType::Research => PriorityLevel::Medium,
            ActionType::Log => PriorityLevel::Low,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

/// Optional numeric engagement metrics. Semantics vary by source (stars for
/// repos, points/comments for HN, views for videos); the scorer only uses
/// them as a boost signal and never requires them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweets: Option<u64>,
}

/// One normalized observation from an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Globally unique, source-namespaced: `source:externalId`. Stable
    /// across runs for the same external item.
    pub id: String,
    pub source: SignalSource,
    /// Origin creation time, ISO-8601.
    pub timestamp: String,
    /// Opaque original payload kept for audit; never interpreted downstream.
    #[serde(default)]
    pub raw: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementMetrics>,
}

/// Six independent dimension scores, each in [1, 5].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricScores {
    pub pain: u8,
    pub roi: u8,
    pub auto_fit: u8,
    pub defensibility: u8,
    pub distribution: u8,
    pub speed: u8,
}

/// Signal plus its rubric evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSignal {
    #[serde(flatten)]
    pub signal: Signal,
    pub scores: RubricScores,
    /// Weighted total in [0, 45], rounded to 2 decimal places.
    pub total_score: f64,
    pub action: ActionType,
    pub priority: PriorityLevel,
    /// One fixed-format audit line; produced for humans, never parsed back.
    pub reasoning: String,
}

/// Existence of an entry for an id means "already routed, do not route again".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub source: SignalSource,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Done,
}

/// One line of a queue log. Created as `pending` on routing; an external
/// consumer may later move it to `processing`/`done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub signal: ScoredSignal,
    pub queued_at: String,
    pub status: QueueStatus,
}

/// Per-monitor counters for one radar run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorReport {
    pub monitor: SignalSource,
    pub fetched: usize,
    pub deduped: usize,
    pub routed: usize,
    pub errors: usize,
}

impl MonitorReport {
    pub fn new(monitor: SignalSource) -> Self {
        Self {
            monitor,
            fetched: 0,
            deduped: 0,
            routed: 0,
            errors: 0,
        }
    }
}
