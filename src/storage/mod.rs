//! storage — durable JSONL state owned by the pipeline.
//!
//! Two exclusive owners: the dedup cache owns `processed.jsonl`, the queue
//! store owns the five queue logs. One JSON object per line, UTF-8,
//! newline-terminated. Full-file rewrites go through a temp file + rename so
//! a crash mid-write never leaves a half-written log behind.

pub mod cache;
pub mod queue;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Whole-file overwrite without a partial-write window.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("jsonl.tmp");
    fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}

/// Serialize entries as JSONL (trailing newline when non-empty).
pub(crate) fn to_jsonl<T: serde::Serialize>(entries: impl IntoIterator<Item = T>) -> Result<String> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&serde_json::to_string(&entry).context("serializing jsonl entry")?);
        out.push('\n');
    }
    Ok(out)
}
