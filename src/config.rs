//! config.rs — layered TOML configuration with per-section fallback.
//!
//! One file (`config/radar.toml` by default, `RADAR_CONFIG_PATH` overrides)
//! with three independent sections: `[monitors]`, `[scoring]`, `[filters]`.
//! A missing or invalid section falls back to that section's built-in
//! default with a warning — configuration problems are never fatal.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/radar.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricWeight {
    pub weight: u32,
    pub description: String,
}

impl RubricWeight {
    fn new(weight: u32, description: &str) -> Self {
        Self {
            weight,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricConfig {
    pub pain: RubricWeight,
    pub roi: RubricWeight,
    pub auto_fit: RubricWeight,
    pub distribution: RubricWeight,
    pub defensibility: RubricWeight,
    pub speed: RubricWeight,
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self {
            pain: RubricWeight::new(8, "Problem acuity"),
            roi: RubricWeight::new(8, "Quantifiable value"),
            auto_fit: RubricWeight::new(8, "Agent solvability"),
            distribution: RubricWeight::new(7, "Reachable buyer base"),
            defensibility: RubricWeight::new(6, "Hard to replicate"),
            speed: RubricWeight::new(8, "Buildable in days"),
        }
    }
}

/// Descending action thresholds over the weighted total. `log` is the floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub alert: f64,
    pub asset: f64,
    pub content: f64,
    pub research: f64,
    pub log: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            alert: 40.0,
            asset: 35.0,
            content: 30.0,
            research: 25.0,
            log: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub rubric: RubricConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl ScoringConfig {
    /// A non-monotonic ladder would make the action classification
    /// ambiguous, and a zero weight would silently erase a dimension, so
    /// both reject the whole section.
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.thresholds;
        let descending =
            t.alert > t.asset && t.asset > t.content && t.content > t.research && t.research >= t.log;
        if !descending {
            return Err(format!(
                "thresholds must be strictly descending (alert > asset > content > research >= log), got {}/{}/{}/{}/{}",
                t.alert, t.asset, t.content, t.research, t.log
            ));
        }
        if t.log < 0.0 {
            return Err("log threshold must be non-negative".into());
        }
        let weights = [
            ("pain", self.rubric.pain.weight),
            ("roi", self.rubric.roi.weight),
            ("autoFit", self.rubric.auto_fit.weight),
            ("distribution", self.rubric.distribution.weight),
            ("defensibility", self.rubric.defensibility.weight),
            ("speed", self.rubric.speed.weight),
        ];
        for (name, w) in weights {
            if w == 0 {
                return Err(format!("rubric weight `{name}` must be a positive integer"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubFilters {
    pub language: String,
    pub min_stars: u64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubConfig {
    pub enabled: bool,
    /// Poll interval in seconds; informational for external schedulers.
    pub interval: u64,
    pub filters: GithubFilters,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 7200,
            filters: GithubFilters {
                language: "typescript".into(),
                min_stars: 10,
                keywords: ["agent", "ai", "llm", "automation", "workflow", "bot"]
                    .map(String::from)
                    .to_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HackernewsFeed {
    ShowHn,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HackernewsMinPoints {
    pub show: u64,
    pub ai: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HackernewsConfig {
    pub enabled: bool,
    pub interval: u64,
    pub sources: Vec<HackernewsFeed>,
    pub min_points: HackernewsMinPoints,
}

impl Default for HackernewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 1800,
            sources: vec![HackernewsFeed::ShowHn, HackernewsFeed::Ai],
            min_points: HackernewsMinPoints { show: 10, ai: 20 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeChannel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeConfig {
    pub enabled: bool,
    pub interval: u64,
    pub channels: Vec<YoutubeChannel>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 3600,
            channels: vec![YoutubeChannel {
                id: "UCt8xK0wfUCn5YTCYEmIDa1g".into(),
                name: "Nate B Jones".into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterConfig {
    pub enabled: bool,
    pub interval: u64,
    pub rss_feeds: Vec<String>,
    pub min_engagement: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: 1800,
            rss_feeds: vec![],
            min_engagement: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitorsConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub hackernews: HackernewsConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
}

/// Global include/exclude keyword filter applied to title+description
/// before scoring. Exclude wins; an empty include list passes everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            include: ["agent", "ai", "llm", "automation", "workflow", "smb", "business"]
                .map(String::from)
                .to_vec(),
            exclude: ["crypto", "nft", "meme", "gambling"].map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub monitors: MonitorsConfig,
    pub scoring: ScoringConfig,
    pub filters: FiltersConfig,
}

/// Resolve the config path: env override first, then the conventional default.
pub fn config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from `path`. Absent file, unparseable TOML or an
/// invalid section each degrade to defaults at the smallest possible scope.
pub fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            tracing::info!(path = %path.display(), "no config file, using built-in defaults");
            return AppConfig::default();
        }
    };

    let doc: toml::Value = match toml::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config is not valid TOML, using built-in defaults");
            return AppConfig::default();
        }
    };

    let monitors = section(&doc, "monitors").unwrap_or_default();
    let filters = section(&doc, "filters").unwrap_or_default();
    let scoring: ScoringConfig = section(&doc, "scoring").unwrap_or_default();

    let scoring = match scoring.validate() {
        Ok(()) => scoring,
        Err(reason) => {
            warn!(%reason, "invalid [scoring] section, falling back to defaults");
            ScoringConfig::default()
        }
    };

    AppConfig {
        monitors,
        scoring,
        filters,
    }
}

/// Deserialize one top-level table leniently; `None` means "use defaults".
fn section<T: serde::de::DeserializeOwned>(doc: &toml::Value, name: &str) -> Option<T> {
    let value = doc.get(name)?;
    match value.clone().try_into::<T>() {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(section = name, error = %e, "invalid config section, falling back to defaults");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn non_descending_thresholds_are_rejected() {
        let mut s = ScoringConfig::default();
        s.thresholds.asset = s.thresholds.alert;
        assert!(s.validate().is_err());
    }

    #[test]
    fn zero_weight_is_rejected() {
        let mut s = ScoringConfig::default();
        s.rubric.speed.weight = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn bad_section_falls_back_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radar.toml");
        // [filters] is malformed (include must be an array); [scoring] is valid.
        std::fs::write(
            &path,
            r#"
[filters]
include = "agent"

[scoring.thresholds]
alert = 41.0
asset = 36.0
content = 31.0
research = 26.0
log = 0.0
"#,
        )
        .unwrap();

        let cfg = load_config(&path);
        assert_eq!(cfg.filters, FiltersConfig::default());
        assert_eq!(cfg.scoring.thresholds.alert, 41.0);
        assert_eq!(cfg.monitors, MonitorsConfig::default());
    }

    #[test]
    fn invalid_threshold_order_falls_back_to_default_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radar.toml");
        std::fs::write(
            &path,
            r#"
[scoring.thresholds]
alert = 10.0
asset = 35.0
content = 30.0
research = 25.0
log = 0.0
"#,
        )
        .unwrap();

        let cfg = load_config(&path);
        assert_eq!(cfg.scoring, ScoringConfig::default());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = load_config(Path::new("does/not/exist/radar.toml"));
        assert_eq!(cfg, AppConfig::default());
    }

    #[serial_test::serial]
    #[test]
    fn env_var_overrides_config_path() {
        std::env::set_var(ENV_CONFIG_PATH, "/tmp/custom-radar.toml");
        assert_eq!(config_path(), PathBuf::from("/tmp/custom-radar.toml"));
        std::env::remove_var(ENV_CONFIG_PATH);
        assert_eq!(config_path(), PathBuf::from(DEFAULT_CONFIG_PATH));
    }
}
