//! cache.rs — persistent deduplication cache.
//!
//! An append-only `processed.jsonl` loaded fully into memory on open.
//! Existence of an id means "already routed, must not be routed again".
//! Malformed lines are skipped with a warning and an absent or corrupt file
//! is treated as empty — the cache never fails to open because of bad data.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::signal::{CacheEntry, SignalSource};
use crate::storage::{to_jsonl, write_atomic};

pub const CACHE_FILE: &str = "processed.jsonl";

/// Entries kept after compaction. Oldest entries are dropped first: recency
/// bias matches how the monitors work (a 24h window makes old ids unlikely
/// to reappear).
pub const MAX_CACHE_ENTRIES: usize = 20_000;

pub struct DedupCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
    /// First-append order of ids; re-adding an id keeps its position.
    order: Vec<String>,
}

impl DedupCache {
    /// Open (and if needed compact) the cache under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with_cap(dir, MAX_CACHE_ENTRIES)
    }

    // Cap is parameterized for tests only; production callers use `open`.
    pub(crate) fn open_with_cap(dir: &Path, cap: usize) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(CACHE_FILE);

        let mut cache = Self {
            path,
            entries: HashMap::new(),
            order: Vec::new(),
        };
        cache.load()?;

        if cache.entries.len() > cap {
            let dropped = cache.entries.len() - cap;
            let cutoff = cache.order.len() - cap;
            for id in cache.order.drain(..cutoff) {
                cache.entries.remove(&id);
            }
            cache.flush()?;
            info!(dropped, kept = cap, "dedup cache compacted");
        }

        Ok(cache)
    }

    fn load(&mut self) -> Result<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            // Absent file == empty cache.
            Err(_) => return Ok(()),
        };

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<CacheEntry>(line) {
                Ok(entry) => {
                    if !self.entries.contains_key(&entry.id) {
                        self.order.push(entry.id.clone());
                    }
                    self.entries.insert(entry.id.clone(), entry);
                }
                Err(e) => warn!(error = %e, line, "skipping malformed cache line"),
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let contents = to_jsonl(self.order.iter().filter_map(|id| self.entries.get(id)))?;
        write_atomic(&self.path, &contents)
    }

    /// Pure in-memory lookup, O(1).
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record an id as processed. Idempotent: re-adding overwrites the
    /// in-memory entry without duplicating the id in the order index, but
    /// still appends one durable line (compaction on a later open dedups).
    pub fn add(&mut self, id: &str, source: SignalSource) -> Result<()> {
        let entry = CacheEntry {
            id: id.to_string(),
            source,
            timestamp: Utc::now().to_rfc3339(),
        };

        if !self.entries.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.entries.insert(id.to_string(), entry.clone());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {} for append", self.path.display()))?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)
            .with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.order.clear();
        write_atomic(&self.path, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_is_an_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DedupCache::open(dir.path()).unwrap();
        assert!(cache.is_empty());
        assert!(!cache.has("github:1"));
    }

    #[test]
    fn add_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = DedupCache::open(dir.path()).unwrap();
            cache.add("github:1", SignalSource::Github).unwrap();
            cache.add("hackernews:2", SignalSource::Hackernews).unwrap();
        }
        let cache = DedupCache::open(dir.path()).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.has("github:1"));
        assert!(cache.has("hackernews:2"));
    }

    #[test]
    fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DedupCache::open(dir.path()).unwrap();
        cache.add("github:1", SignalSource::Github).unwrap();
        cache.add("github:1", SignalSource::Github).unwrap();
        assert!(cache.has("github:1"));
        assert_eq!(cache.len(), 1);

        // Reload also sees a single logical entry.
        drop(cache);
        let cache = DedupCache::open(dir.path()).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(
            &path,
            "{\"id\":\"github:1\",\"source\":\"github\",\"timestamp\":\"t\"}\nnot json at all\n{broken\n",
        )
        .unwrap();

        let cache = DedupCache::open(dir.path()).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.has("github:1"));
    }

    #[test]
    fn compaction_keeps_most_recent_and_rewrites_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = DedupCache::open(dir.path()).unwrap();
            for i in 0..6 {
                cache.add(&format!("github:{i}"), SignalSource::Github).unwrap();
            }
            // Duplicate append for an early id must not rescue it from
            // compaction (order is first-append).
            cache.add("github:0", SignalSource::Github).unwrap();
        }

        let cache = DedupCache::open_with_cap(dir.path(), 4).unwrap();
        assert_eq!(cache.len(), 4);
        for i in 2..6 {
            assert!(cache.has(&format!("github:{i}")), "expected github:{i} kept");
        }
        assert!(!cache.has("github:0"));
        assert!(!cache.has("github:1"));

        // The rewritten log holds exactly one line per surviving id.
        let content = fs::read_to_string(dir.path().join(CACHE_FILE)).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn clear_truncates_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DedupCache::open(dir.path()).unwrap();
        cache.add("github:1", SignalSource::Github).unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty());
        let content = fs::read_to_string(dir.path().join(CACHE_FILE)).unwrap();
        assert!(content.is_empty());
    }
}
