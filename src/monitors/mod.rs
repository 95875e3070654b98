//! monitors — one implementation per external source, behind a shared trait.
//!
//! A monitor turns source-specific configuration into a finite list of
//! normalized [`Signal`]s for recent activity. Shared plumbing (HTTP with
//! bounded retry/backoff, inter-request pacing, id namespacing, recency
//! window, text normalization) lives here so the per-source files only
//! carry their wire formats and filter rules.

pub mod github;
pub mod hackernews;
pub mod twitter;
pub mod youtube;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

use crate::config::MonitorsConfig;
use crate::signal::{Signal, SignalSource};

/// Hard recency window shared by all sources: only activity from the last
/// 24 hours is considered "new".
pub const RECENCY_HOURS: i64 = 24;

const USER_AGENT: &str = concat!("signal-radar/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[async_trait]
pub trait Monitor: Send + Sync {
    fn name(&self) -> SignalSource;

    /// Fetch new activity. Must return `Ok(vec![])` when the source is
    /// disabled by configuration; errors mean unrecoverable I/O failure
    /// after retries.
    async fn fetch(&self) -> Result<Vec<Signal>>;
}

/// Build the monitor set for one run, optionally restricted to one source.
pub fn build_monitors(cfg: &MonitorsConfig, only: Option<SignalSource>) -> Vec<Box<dyn Monitor>> {
    let all: Vec<Box<dyn Monitor>> = vec![
        Box::new(github::GithubMonitor::new(cfg.github.clone())),
        Box::new(hackernews::HackernewsMonitor::new(cfg.hackernews.clone())),
        Box::new(youtube::YoutubeMonitor::new(cfg.youtube.clone())),
        Box::new(twitter::TwitterMonitor::new(cfg.twitter.clone())),
    ];
    match only {
        Some(source) => all.into_iter().filter(|m| m.name() == source).collect(),
        None => all,
    }
}

/// Shared HTTP context: one client per run, retry with doubling backoff,
/// and fixed pacing delays so a monitor never bursts an external API.
pub struct MonitorContext {
    client: reqwest::Client,
}

impl Default for MonitorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorContext {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET + JSON decode with bounded retry (3 attempts, 500ms base delay,
    /// doubling each attempt). Fails permanently after exhausting retries.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let mut delay = RETRY_BASE_DELAY;
        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 1..=RETRY_ATTEMPTS {
            match self.try_get(url, headers).await {
                Ok(resp) => {
                    return resp
                        .json::<T>()
                        .await
                        .with_context(|| format!("decoding json from {url}"));
                }
                Err(e) => {
                    if attempt < RETRY_ATTEMPTS {
                        warn!(attempt, error = %e, url, "fetch failed, retrying");
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| anyhow!("fetch failed"));
        Err(err.context(format!("fetching {url} after {RETRY_ATTEMPTS} attempts")))
    }

    /// GET as text, single attempt (feed endpoints are cheap to skip for
    /// one run; the next invocation picks the items up again).
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.try_get(url, &[]).await?;
        resp.text().await.with_context(|| format!("reading body from {url}"))
    }

    async fn try_get(&self, url: &str, headers: &[(&str, &str)]) -> Result<reqwest::Response> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let resp = req.send().await.with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(anyhow!("HTTP {status} from {url}: {snippet}"));
        }
        Ok(resp)
    }

    /// Fixed inter-request delay to respect external API pacing.
    pub async fn pace(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Deterministic, source-namespaced signal identity.
pub fn signal_id(source: SignalSource, external_id: &str) -> String {
    format!("{source}:{external_id}")
}

/// True when `timestamp` (RFC 3339 or RFC 2822) falls within the last
/// `hours`. Unparseable timestamps are treated as stale.
pub fn within_last_hours(timestamp: &str, hours: i64) -> bool {
    let parsed = chrono::DateTime::parse_from_rfc3339(timestamp)
        .or_else(|_| chrono::DateTime::parse_from_rfc2822(timestamp));
    match parsed {
        Ok(t) => {
            let cutoff = chrono::Utc::now() - chrono::Duration::hours(hours);
            t.with_timezone(&chrono::Utc) >= cutoff
        }
        Err(_) => false,
    }
}

/// Normalize display text coming out of feeds: decode HTML entities, strip
/// tags, fold typographic quotes, collapse whitespace, cap the length.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let mut out = html_escape::decode_html_entities(s).to_string();
    out = RE_TAGS.replace_all(&out, " ").to_string();
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    out = RE_WS.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }
    out
}

/// Convert an RFC 2822 feed date (`Mon, 02 Jan 2006 15:04:05 +0000`) to
/// ISO-8601; `None` when the input does not parse. Falls back to chrono for
/// feeds that emit obsolete zone names like `GMT`.
pub fn rfc2822_to_iso(ts: &str) -> Option<String> {
    use time::format_description::well_known::{Rfc2822, Rfc3339};
    if let Ok(dt) = time::OffsetDateTime::parse(ts, &Rfc2822) {
        return dt.to_offset(time::UtcOffset::UTC).format(&Rfc3339).ok();
    }
    chrono::DateTime::parse_from_rfc2822(ts)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc).to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_ids_are_source_namespaced() {
        assert_eq!(signal_id(SignalSource::Github, "42"), "github:42");
        assert_eq!(signal_id(SignalSource::Hackernews, "42"), "hackernews:42");
    }

    #[test]
    fn recency_window_accepts_fresh_rejects_stale_and_garbage() {
        let fresh = chrono::Utc::now().to_rfc3339();
        assert!(within_last_hours(&fresh, RECENCY_HOURS));

        let stale = (chrono::Utc::now() - chrono::Duration::hours(48)).to_rfc3339();
        assert!(!within_last_hours(&stale, RECENCY_HOURS));

        assert!(!within_last_hours("yesterday-ish", RECENCY_HOURS));
    }

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "  <p>Hello,&nbsp;&nbsp;<b>world</b></p>\n\n ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn rfc2822_dates_become_iso() {
        let iso = rfc2822_to_iso("Sat, 16 Aug 2025 10:00:00 GMT").unwrap();
        assert_eq!(iso, "2025-08-16T10:00:00Z");
        assert!(rfc2822_to_iso("not a date").is_none());
    }

    #[test]
    fn build_monitors_can_restrict_to_one_source() {
        let cfg = MonitorsConfig::default();
        assert_eq!(build_monitors(&cfg, None).len(), 4);
        let only = build_monitors(&cfg, Some(SignalSource::Youtube));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name(), SignalSource::Youtube);
    }
}
