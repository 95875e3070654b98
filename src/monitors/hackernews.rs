//! hackernews.rs — Algolia search monitor for Show HN and AI stories.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{HackernewsConfig, HackernewsFeed};
use crate::monitors::{normalize_text, signal_id, within_last_hours, Monitor, MonitorContext, RECENCY_HOURS};
use crate::signal::{EngagementMetrics, Signal, SignalSource};

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search_by_date";
const AI_QUERY: &str = "ai agent automation llm";
const PAGE_SIZE: &str = "50";

// Secondary gate for the broad AI query; Algolia matches loosely.
static RE_AI_TOPIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(ai|agent|automation|llm|workflow)").unwrap());

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    story_title: Option<String>,
    url: Option<String>,
    story_url: Option<String>,
    author: String,
    created_at: String,
    #[serde(default)]
    points: u64,
    #[serde(default)]
    num_comments: u64,
    story_text: Option<String>,
    #[serde(rename = "_tags", default)]
    tags: Vec<String>,
}

impl Hit {
    fn display_title(&self) -> Option<&str> {
        self.title.as_deref().or(self.story_title.as_deref())
    }

    fn display_url(&self) -> String {
        self.url
            .clone()
            .or_else(|| self.story_url.clone())
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", self.object_id))
    }
}

pub struct HackernewsMonitor {
    cfg: HackernewsConfig,
    ctx: MonitorContext,
}

impl HackernewsMonitor {
    pub fn new(cfg: HackernewsConfig) -> Self {
        Self {
            cfg,
            ctx: MonitorContext::new(),
        }
    }

    fn feed_url(&self, feed: HackernewsFeed) -> Result<String> {
        let url = match feed {
            HackernewsFeed::ShowHn => {
                let points = format!("points>{}", self.cfg.min_points.show);
                reqwest::Url::parse_with_params(
                    SEARCH_URL,
                    &[
                        ("tags", "show_hn"),
                        ("numericFilters", points.as_str()),
                        ("hitsPerPage", PAGE_SIZE),
                    ],
                )?
            }
            HackernewsFeed::Ai => {
                let points = format!("points>{}", self.cfg.min_points.ai);
                reqwest::Url::parse_with_params(
                    SEARCH_URL,
                    &[
                        ("query", AI_QUERY),
                        ("tags", "story"),
                        ("numericFilters", points.as_str()),
                        ("hitsPerPage", PAGE_SIZE),
                    ],
                )?
            }
        };
        Ok(url.into())
    }

    fn keep_hit(&self, feed: HackernewsFeed, hit: &Hit) -> bool {
        if !within_last_hours(&hit.created_at, RECENCY_HOURS) {
            return false;
        }
        let Some(title) = hit.display_title() else {
            return false;
        };
        match feed {
            HackernewsFeed::ShowHn => hit.points >= self.cfg.min_points.show,
            HackernewsFeed::Ai => {
                if hit.points < self.cfg.min_points.ai {
                    return false;
                }
                let blob = format!("{title} {}", hit.story_text.as_deref().unwrap_or_default())
                    .to_lowercase();
                RE_AI_TOPIC.is_match(&blob)
            }
        }
    }

    fn to_signal(&self, feed: HackernewsFeed, hit: &Hit) -> Signal {
        let mut tags = hit.tags.clone();
        if feed == HackernewsFeed::ShowHn && !tags.iter().any(|t| t == "show_hn") {
            tags.insert(0, "show_hn".to_string());
        }

        Signal {
            id: signal_id(self.name(), &hit.object_id),
            source: self.name(),
            timestamp: hit.created_at.clone(),
            raw: serde_json::to_value(hit).unwrap_or_default(),
            title: hit.display_title().map(normalize_text),
            url: Some(hit.display_url()),
            author: Some(hit.author.clone()),
            description: hit.story_text.as_deref().map(normalize_text),
            tags,
            engagement: Some(EngagementMetrics {
                comments: Some(hit.num_comments),
                likes: Some(hit.points),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl Monitor for HackernewsMonitor {
    fn name(&self) -> SignalSource {
        SignalSource::Hackernews
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        if !self.cfg.enabled {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for (i, feed) in self.cfg.sources.iter().copied().enumerate() {
            if i > 0 {
                self.ctx.pace(350).await;
            }
            let url = self.feed_url(feed)?;
            let data: SearchResponse = self.ctx.get_json(&url, &[]).await?;

            for hit in &data.hits {
                if !self.keep_hit(feed, hit) {
                    continue;
                }
                let signal = self.to_signal(feed, hit);
                if seen.insert(signal.id.clone()) {
                    out.push(signal);
                }
            }
        }

        Ok(out)
    }
}
