//! queue.rs — durable, append-only priority queues.
//!
//! Five fixed queues, each its own JSONL log. `enqueue` is a pure append;
//! `read` is a full scan that skips malformed lines so one corrupted line
//! never makes the rest of a queue unreadable. `update_status` is the only
//! read-then-rewrite operation and goes through an atomic whole-file
//! overwrite. Optimized for low write volume with occasional full scans.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ThresholdConfig;
use crate::scorer::action_for_total;
use crate::signal::{ActionType, QueueEntry, QueueStatus, ScoredSignal};
use crate::storage::{to_jsonl, write_atomic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueName {
    Urgent,
    Assets,
    Content,
    Research,
    All,
}

impl QueueName {
    pub const ALL_QUEUES: [QueueName; 5] = [
        QueueName::Urgent,
        QueueName::Assets,
        QueueName::Content,
        QueueName::Research,
        QueueName::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::Urgent => "urgent",
            QueueName::Assets => "assets",
            QueueName::Content => "content",
            QueueName::Research => "research",
            QueueName::All => "all",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            QueueName::Urgent => "urgent.jsonl",
            QueueName::Assets => "assets.jsonl",
            QueueName::Content => "content.jsonl",
            QueueName::Research => "research.jsonl",
            QueueName::All => "all.jsonl",
        }
    }
}

impl From<ActionType> for QueueName {
    fn from(action: ActionType) -> Self {
        match action {
            ActionType::Alert => QueueName::Urgent,
            ActionType::Asset => QueueName::Assets,
            ActionType::Content => QueueName::Content,
            ActionType::Research => QueueName::Research,
            ActionType::Log => QueueName::All,
        }
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
}

pub struct QueueStore {
    dir: PathBuf,
    /// Same ladder the scorer classifies with, so queue and action always agree.
    thresholds: ThresholdConfig,
}

impl QueueStore {
    pub fn open(dir: &Path, thresholds: ThresholdConfig) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for queue in QueueName::ALL_QUEUES {
            let path = dir.join(queue.file_name());
            if !path.exists() {
                fs::write(&path, "").with_context(|| format!("initializing {}", path.display()))?;
            }
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            thresholds,
        })
    }

    fn queue_path(&self, queue: QueueName) -> PathBuf {
        self.dir.join(queue.file_name())
    }

    /// Destination for a weighted total. Nothing but the score matters.
    pub fn queue_for_score(&self, total: f64) -> QueueName {
        action_for_total(&self.thresholds, total).into()
    }

    /// Append to the destination queue and (unless that already is `all`)
    /// to the catch-all queue. Returns the primary destination.
    pub fn enqueue(&self, signal: ScoredSignal) -> Result<QueueName> {
        let primary = self.queue_for_score(signal.total_score);
        let entry = QueueEntry {
            signal,
            queued_at: Utc::now().to_rfc3339(),
            status: QueueStatus::Pending,
        };

        let line = serde_json::to_string(&entry).context("serializing queue entry")?;
        self.append_line(primary, &line)?;
        if primary != QueueName::All {
            self.append_line(QueueName::All, &line)?;
        }
        Ok(primary)
    }

    fn append_line(&self, queue: QueueName, line: &str) -> Result<()> {
        let path = self.queue_path(queue);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {} for append", path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("appending to {}", path.display()))?;
        Ok(())
    }

    /// Full-log scan. Malformed lines are dropped, not errors.
    pub fn read(&self, queue: QueueName) -> Result<Vec<QueueEntry>> {
        let path = self.queue_path(queue);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Ok(Vec::new()),
        };

        let mut out = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<QueueEntry>(line) {
                Ok(entry) => out.push(entry),
                Err(e) => debug!(queue = %queue, error = %e, "skipping malformed queue line"),
            }
        }
        Ok(out)
    }

    /// Replace the status of the entry matching `signal_id` (exact id
    /// equality, at most one match expected) and rewrite the whole log.
    pub fn update_status(&self, queue: QueueName, signal_id: &str, status: QueueStatus) -> Result<()> {
        let updated: Vec<QueueEntry> = self
            .read(queue)?
            .into_iter()
            .map(|mut entry| {
                if entry.signal.signal.id == signal_id {
                    entry.status = status;
                }
                entry
            })
            .collect();

        write_atomic(&self.queue_path(queue), &to_jsonl(updated)?)
    }

    pub fn stats(&self) -> Result<BTreeMap<QueueName, QueueStats>> {
        let mut result = BTreeMap::new();
        for queue in QueueName::ALL_QUEUES {
            let entries = self.read(queue)?;
            let mut stats = QueueStats {
                total: entries.len(),
                ..Default::default()
            };
            for entry in &entries {
                match entry.status {
                    QueueStatus::Pending => stats.pending += 1,
                    QueueStatus::Processing => stats.processing += 1,
                    QueueStatus::Done => stats.done += 1,
                }
            }
            result.insert(queue, stats);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RubricConfig;
    use crate::scorer::SignalScorer;
    use crate::signal::{Signal, SignalSource};

    fn scored(id: &str, total: f64) -> ScoredSignal {
        let scorer = SignalScorer::new(RubricConfig::default(), ThresholdConfig::default());
        let mut s = scorer.score(&Signal {
            id: id.into(),
            source: SignalSource::Github,
            timestamp: "2025-08-16T10:00:00Z".into(),
            raw: serde_json::Value::Null,
            title: None,
            url: None,
            author: None,
            description: None,
            tags: vec![],
            engagement: None,
        });
        // Pin the total so routing bands are exercised directly.
        s.total_score = total;
        s
    }

    #[test]
    fn score_bands_map_to_queues() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::open(dir.path(), ThresholdConfig::default()).unwrap();
        assert_eq!(store.queue_for_score(45.0), QueueName::Urgent);
        assert_eq!(store.queue_for_score(40.0), QueueName::Urgent);
        assert_eq!(store.queue_for_score(35.0), QueueName::Assets);
        assert_eq!(store.queue_for_score(30.0), QueueName::Content);
        assert_eq!(store.queue_for_score(25.0), QueueName::Research);
        assert_eq!(store.queue_for_score(24.9), QueueName::All);
        assert_eq!(store.queue_for_score(0.0), QueueName::All);
    }

    #[test]
    fn enqueue_appends_to_primary_and_all_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::open(dir.path(), ThresholdConfig::default()).unwrap();

        assert_eq!(store.enqueue(scored("github:a", 41.0)).unwrap(), QueueName::Urgent);
        assert_eq!(store.enqueue(scored("github:b", 10.0)).unwrap(), QueueName::All);

        assert_eq!(store.read(QueueName::Urgent).unwrap().len(), 1);
        // Low-score entry landed only once in `all` (no duplicate append).
        let all = store.read(QueueName::All).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            all.iter().filter(|e| e.signal.signal.id == "github:b").count(),
            1
        );
    }

    #[test]
    fn read_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::open(dir.path(), ThresholdConfig::default()).unwrap();
        store.enqueue(scored("github:a", 41.0)).unwrap();

        // Corrupt one line in the middle by hand.
        let path = dir.path().join("urgent.jsonl");
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{{{ definitely not json\n");
        fs::write(&path, content).unwrap();
        store.enqueue(scored("github:b", 42.0)).unwrap();

        let entries = store.read(QueueName::Urgent).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn update_status_rewrites_only_the_matching_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::open(dir.path(), ThresholdConfig::default()).unwrap();
        store.enqueue(scored("github:a", 41.0)).unwrap();
        store.enqueue(scored("github:b", 42.0)).unwrap();

        store
            .update_status(QueueName::Urgent, "github:a", QueueStatus::Done)
            .unwrap();

        let entries = store.read(QueueName::Urgent).unwrap();
        let a = entries.iter().find(|e| e.signal.signal.id == "github:a").unwrap();
        let b = entries.iter().find(|e| e.signal.signal.id == "github:b").unwrap();
        assert_eq!(a.status, QueueStatus::Done);
        assert_eq!(b.status, QueueStatus::Pending);
    }

    #[test]
    fn stats_count_per_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::open(dir.path(), ThresholdConfig::default()).unwrap();
        store.enqueue(scored("github:a", 41.0)).unwrap();
        store.enqueue(scored("github:b", 36.0)).unwrap();
        store
            .update_status(QueueName::Assets, "github:b", QueueStatus::Processing)
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats[&QueueName::Urgent].total, 1);
        assert_eq!(stats[&QueueName::Urgent].pending, 1);
        assert_eq!(stats[&QueueName::Assets].processing, 1);
        assert_eq!(stats[&QueueName::All].total, 2);
    }
}
