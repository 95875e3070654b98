//! youtube.rs — channel upload monitor over the public Atom feeds.
//!
//! No API key needed: `https://www.youtube.com/feeds/videos.xml?channel_id=…`
//! lists the latest uploads per channel.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};

use crate::config::YoutubeConfig;
use crate::monitors::{normalize_text, signal_id, within_last_hours, Monitor, MonitorContext, RECENCY_HOURS};
use crate::signal::{Signal, SignalSource};

const FEED_PACE_MS: u64 = 350;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    title: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    author: Option<Author>,
    #[serde(rename = "group")]
    media: Option<MediaGroup>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MediaGroup {
    #[serde(rename = "description")]
    description: Option<String>,
}

pub struct YoutubeMonitor {
    cfg: YoutubeConfig,
    ctx: MonitorContext,
}

impl YoutubeMonitor {
    pub fn new(cfg: YoutubeConfig) -> Self {
        Self {
            cfg,
            ctx: MonitorContext::new(),
        }
    }

    fn entry_signal(&self, entry: &Entry, channel_name: &str) -> Option<Signal> {
        let published = entry.published.clone().or_else(|| entry.updated.clone())?;
        if !within_last_hours(&published, RECENCY_HOURS) {
            return None;
        }

        let video_id = entry.video_id.clone()?;
        let title = entry.title.clone()?;
        let url = entry
            .links
            .iter()
            .find_map(|l| l.href.clone())
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={video_id}"));

        Some(Signal {
            id: signal_id(self.name(), &video_id),
            source: self.name(),
            timestamp: published,
            raw: serde_json::to_value(entry).unwrap_or_default(),
            title: Some(normalize_text(&title)),
            url: Some(url),
            author: entry
                .author
                .as_ref()
                .and_then(|a| a.name.clone())
                .or_else(|| Some(channel_name.to_string())),
            description: entry
                .media
                .as_ref()
                .and_then(|m| m.description.as_deref())
                .map(normalize_text),
            tags: vec!["youtube".into(), "video".into()],
            engagement: None,
        })
    }
}

#[async_trait]
impl Monitor for YoutubeMonitor {
    fn name(&self) -> SignalSource {
        SignalSource::Youtube
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        if !self.cfg.enabled {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for (i, channel) in self.cfg.channels.iter().enumerate() {
            if i > 0 {
                self.ctx.pace(FEED_PACE_MS).await;
            }

            let url = reqwest::Url::parse_with_params(
                "https://www.youtube.com/feeds/videos.xml",
                &[("channel_id", channel.id.as_str())],
            )
            .context("building youtube feed url")?;

            let xml = self.ctx.get_text(url.as_str()).await?;
            let feed: Feed =
                from_str(&xml).with_context(|| format!("parsing atom feed for {}", channel.name))?;

            out.extend(
                feed.entries
                    .iter()
                    .filter_map(|e| self.entry_signal(e, &channel.name)),
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed(published: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <yt:videoId>abc123</yt:videoId>
    <title>Agents in production</title>
    <published>{published}</published>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc123"/>
    <author><name>Nate B Jones</name></author>
    <media:group>
      <media:description>How we run AI agents in an SMB.</media:description>
    </media:group>
  </entry>
  <entry>
    <title>No video id, should be skipped</title>
    <published>{published}</published>
  </entry>
</feed>"#
        )
    }

    #[tokio::test]
    async fn disabled_monitor_returns_empty_without_io() {
        let cfg = YoutubeConfig {
            enabled: false,
            ..Default::default()
        };
        let signals = YoutubeMonitor::new(cfg).fetch().await.unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn fresh_entries_become_signals_incomplete_ones_do_not() {
        let monitor = YoutubeMonitor::new(YoutubeConfig::default());
        let now = chrono::Utc::now().to_rfc3339();
        let feed: Feed = from_str(&sample_feed(&now)).unwrap();

        let signals: Vec<Signal> = feed
            .entries
            .iter()
            .filter_map(|e| monitor.entry_signal(e, "Fallback Channel"))
            .collect();

        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.id, "youtube:abc123");
        assert_eq!(s.url.as_deref(), Some("https://www.youtube.com/watch?v=abc123"));
        assert_eq!(s.author.as_deref(), Some("Nate B Jones"));
        assert_eq!(s.tags, vec!["youtube".to_string(), "video".to_string()]);
        assert!(s.description.as_deref().unwrap().contains("AI agents"));
    }

    #[test]
    fn stale_entries_are_dropped() {
        let monitor = YoutubeMonitor::new(YoutubeConfig::default());
        let stale = (chrono::Utc::now() - chrono::Duration::hours(72)).to_rfc3339();
        let feed: Feed = from_str(&sample_feed(&stale)).unwrap();
        assert!(feed
            .entries
            .iter()
            .filter_map(|e| monitor.entry_signal(e, "x"))
            .next()
            .is_none());
    }
}
