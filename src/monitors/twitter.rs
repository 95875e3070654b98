//! twitter.rs — microblog monitor over RSS/Atom mirror feeds.
//!
//! The platform has no free API, so signals come from configured mirror
//! feeds (nitter instances, curated bridges). Engagement is estimated from
//! the post text ("120 likes", "30 retweets"), which is all a mirror
//! exposes.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TwitterConfig;
use crate::monitors::{
    normalize_text, rfc2822_to_iso, signal_id, within_last_hours, Monitor, MonitorContext,
    RECENCY_HOURS,
};
use crate::signal::{EngagementMetrics, Signal, SignalSource};

const FEED_PACE_MS: u64 = 350;

static RE_METRIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d.,]*)\s*(likes?|retweets?|replies?|hearts?|views?)").unwrap());
static RE_VIRAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(viral|trending|launch|agent|automation|ai)").unwrap());

// -- RSS 2.0 shape --

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RssItem {
    guid: Option<Guid>,
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

/// `<guid>` may carry attributes (isPermaLink); only the text matters.
#[derive(Debug, Serialize, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

// -- Atom shape --

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<String>,
    author: Option<AtomAuthor>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

pub struct TwitterMonitor {
    cfg: TwitterConfig,
    ctx: MonitorContext,
}

impl TwitterMonitor {
    pub fn new(cfg: TwitterConfig) -> Self {
        Self {
            cfg,
            ctx: MonitorContext::new(),
        }
    }

    fn feed_signals(&self, feed_url: &str, xml: &str) -> Result<Vec<Signal>> {
        // Dispatch on the root element; a defaulted `entry` vec would
        // otherwise let arbitrary XML parse as an empty Atom feed.
        match root_element(xml).as_deref() {
            Some("rss") => {
                let rss: Rss =
                    from_str(xml).with_context(|| format!("parsing rss feed {feed_url}"))?;
                Ok(rss
                    .channel
                    .items
                    .iter()
                    .filter_map(|item| self.rss_signal(feed_url, item))
                    .collect())
            }
            Some("feed") => {
                let atom: AtomFeed =
                    from_str(xml).with_context(|| format!("parsing atom feed {feed_url}"))?;
                Ok(atom
                    .entries
                    .iter()
                    .filter_map(|entry| self.atom_signal(feed_url, entry))
                    .collect())
            }
            _ => Err(anyhow!("{feed_url}: neither RSS nor Atom")),
        }
    }

    fn rss_signal(&self, feed_url: &str, item: &RssItem) -> Option<Signal> {
        let timestamp = rfc2822_to_iso(item.pub_date.as_deref()?)?;
        if !within_last_hours(&timestamp, RECENCY_HOURS) {
            return None;
        }

        let title = item.title.clone().unwrap_or_else(|| "Post".to_string());
        let description = item.description.clone().unwrap_or_default();
        let engagement = estimate_engagement(&format!("{title} {description}"));
        if engagement < self.cfg.min_engagement {
            return None;
        }

        let external_id = item
            .guid
            .as_ref()
            .and_then(|g| g.value.clone())
            .or_else(|| item.link.clone())
            .unwrap_or_else(|| format!("{feed_url}:{timestamp}"));

        Some(Signal {
            id: signal_id(self.name(), &external_id),
            source: self.name(),
            timestamp,
            raw: serde_json::to_value(item).unwrap_or_default(),
            title: Some(normalize_text(&title)),
            url: item.link.clone(),
            author: item.author.clone(),
            description: Some(normalize_text(&description)),
            tags: vec!["twitter".into(), "x".into()],
            engagement: Some(EngagementMetrics {
                likes: Some(engagement),
                ..Default::default()
            }),
        })
    }

    fn atom_signal(&self, feed_url: &str, entry: &AtomEntry) -> Option<Signal> {
        let timestamp = entry.published.clone().or_else(|| entry.updated.clone())?;
        if !within_last_hours(&timestamp, RECENCY_HOURS) {
            return None;
        }

        let title = entry.title.clone().unwrap_or_else(|| "Post".to_string());
        let summary = entry.summary.clone().unwrap_or_default();
        let engagement = estimate_engagement(&format!("{title} {summary}"));
        if engagement < self.cfg.min_engagement {
            return None;
        }

        let external_id = entry
            .id
            .clone()
            .unwrap_or_else(|| format!("{feed_url}:{timestamp}"));

        Some(Signal {
            id: signal_id(self.name(), &external_id),
            source: self.name(),
            timestamp,
            raw: serde_json::to_value(entry).unwrap_or_default(),
            title: Some(normalize_text(&title)),
            url: entry.links.iter().find_map(|l| l.href.clone()),
            author: entry.author.as_ref().and_then(|a| a.name.clone()),
            description: Some(normalize_text(&summary)),
            tags: vec!["twitter".into(), "x".into()],
            engagement: Some(EngagementMetrics {
                likes: Some(engagement),
                ..Default::default()
            }),
        })
    }
}

#[async_trait]
impl Monitor for TwitterMonitor {
    fn name(&self) -> SignalSource {
        SignalSource::Twitter
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        if !self.cfg.enabled || self.cfg.rss_feeds.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for (i, feed_url) in self.cfg.rss_feeds.iter().enumerate() {
            if i > 0 {
                self.ctx.pace(FEED_PACE_MS).await;
            }
            let xml = self.ctx.get_text(feed_url).await?;
            out.append(&mut self.feed_signals(feed_url, &xml)?);
        }
        Ok(out)
    }
}

/// Local name of the document's root element.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = e.name();
                let local = name.local_name();
                return Some(String::from_utf8_lossy(local.as_ref()).into_owned());
            }
            Ok(quick_xml::events::Event::Eof) | Err(_) => return None,
            _ => continue,
        }
    }
}

/// Sum any "N likes/retweets/replies/hearts/views" mentions in the text;
/// posts with zero mentions but viral-ish wording get a small floor so
/// they survive a low `min_engagement`.
fn estimate_engagement(content: &str) -> u64 {
    let normalized = content.to_lowercase();
    let mut score = 0f64;

    for cap in RE_METRIC.captures_iter(&normalized) {
        let number = cap[1].replace(',', "");
        if let Ok(value) = number.parse::<f64>() {
            score += value;
        }
    }

    if score == 0.0 && RE_VIRAL.is_match(&normalized) {
        score = 10.0;
    }

    score.round() as u64
}
