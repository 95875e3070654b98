//! github.rs — repository search monitor.
//!
//! One search query per configured keyword against repos created in the
//! last day, deduplicated by repo id across queries. Sends a bearer token
//! when `GITHUB_TOKEN` is set; unauthenticated search works but rate-limits
//! sooner.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::GithubConfig;
use crate::monitors::{normalize_text, signal_id, Monitor, MonitorContext};
use crate::signal::{EngagementMetrics, Signal, SignalSource};

const SEARCH_URL: &str = "https://api.github.com/search/repositories";
const API_VERSION: &str = "2022-11-28";
const QUERY_PACE_MS: u64 = 700;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<Repo>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Repo {
    id: u64,
    full_name: String,
    html_url: String,
    description: Option<String>,
    stargazers_count: u64,
    created_at: String,
    owner: Owner,
    #[serde(default)]
    topics: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Owner {
    login: String,
}

pub struct GithubMonitor {
    cfg: GithubConfig,
    ctx: MonitorContext,
}

impl GithubMonitor {
    pub fn new(cfg: GithubConfig) -> Self {
        Self {
            cfg,
            ctx: MonitorContext::new(),
        }
    }

    fn search_url(&self, keyword: &str, created_since: &str) -> Result<String> {
        let query = format!(
            "{keyword} in:name,description,readme language:{} created:>={created_since} stars:>={}",
            self.cfg.filters.language, self.cfg.filters.min_stars
        );
        let url = reqwest::Url::parse_with_params(
            SEARCH_URL,
            &[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", "30"),
            ],
        )
        .context("building github search url")?;
        Ok(url.into())
    }
}

#[async_trait]
impl Monitor for GithubMonitor {
    fn name(&self) -> SignalSource {
        SignalSource::Github
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        if !self.cfg.enabled {
            return Ok(Vec::new());
        }

        let token = std::env::var("GITHUB_TOKEN").ok();
        let auth = token.as_deref().map(|t| format!("Bearer {t}"));
        let created_since = (chrono::Utc::now() - chrono::Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for (i, keyword) in self.cfg.filters.keywords.iter().enumerate() {
            if i > 0 {
                // Search API dislikes bursts even when authenticated.
                self.ctx.pace(QUERY_PACE_MS).await;
            }

            let url = self.search_url(keyword, &created_since)?;
            let mut headers = vec![("X-GitHub-Api-Version", API_VERSION)];
            if let Some(auth) = auth.as_deref() {
                headers.push(("Authorization", auth));
            }
            let data: SearchResponse = self.ctx.get_json(&url, &headers).await?;

            for repo in data.items {
                let Some(description) = repo.description.clone() else {
                    continue;
                };
                if repo.stargazers_count < self.cfg.filters.min_stars {
                    continue;
                }

                let id = signal_id(self.name(), &repo.id.to_string());
                if !seen.insert(id.clone()) {
                    continue;
                }

                out.push(Signal {
                    id,
                    source: self.name(),
                    timestamp: repo.created_at.clone(),
                    raw: serde_json::to_value(&repo).unwrap_or_default(),
                    title: Some(repo.full_name.clone()),
                    url: Some(repo.html_url.clone()),
                    author: Some(repo.owner.login.clone()),
                    description: Some(normalize_text(&description)),
                    tags: repo.topics.clone(),
                    engagement: Some(EngagementMetrics {
                        stars: Some(repo.stargazers_count),
                        ..Default::default()
                    }),
                });
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_monitor_returns_empty_without_io() {
        let cfg = GithubConfig {
            enabled: false,
            ..Default::default()
        };
        let signals = GithubMonitor::new(cfg).fetch().await.unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn search_url_encodes_query() {
        let monitor = GithubMonitor::new(GithubConfig::default());
        let url = monitor.search_url("ai agent", "2025-08-15").unwrap();
        assert!(url.starts_with(SEARCH_URL));
        assert!(url.contains("per_page=30"));
        // Spaces must be encoded for the search API.
        assert!(!url.contains(' '));
    }
}
