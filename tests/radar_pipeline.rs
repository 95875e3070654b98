// tests/radar_pipeline.rs
//
// End-to-end orchestrator behavior with stub monitors: dedup across runs,
// silent keyword drops, monitor error isolation and the exit policy.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use signal_radar::config::{AppConfig, FiltersConfig};
use signal_radar::monitors::Monitor;
use signal_radar::pipeline::{run_failed, run_radar, PipelinePaths, RUN_SUMMARY_FILE};
use signal_radar::{Signal, SignalSource};

struct StaticMonitor {
    source: SignalSource,
    signals: Vec<Signal>,
}

#[async_trait]
impl Monitor for StaticMonitor {
    fn name(&self) -> SignalSource {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        Ok(self.signals.clone())
    }
}

struct FailingMonitor(SignalSource);

#[async_trait]
impl Monitor for FailingMonitor {
    fn name(&self) -> SignalSource {
        self.0
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        Err(anyhow!("simulated upstream outage"))
    }
}

fn signal(id: &str, source: SignalSource, title: &str) -> Signal {
    Signal {
        id: id.into(),
        source,
        timestamp: chrono::Utc::now().to_rfc3339(),
        raw: serde_json::Value::Null,
        title: Some(title.into()),
        url: None,
        author: None,
        description: None,
        tags: vec![],
        engagement: None,
    }
}

/// Open filter config so stub titles pass untouched.
fn open_config() -> AppConfig {
    AppConfig {
        filters: FiltersConfig {
            include: vec![],
            exclude: vec![],
        },
        ..Default::default()
    }
}

fn paths_in(dir: &tempfile::TempDir) -> PipelinePaths {
    PipelinePaths {
        queues_dir: dir.path().join("queues"),
        logs_dir: dir.path().join("logs"),
    }
}

#[tokio::test]
async fn second_run_dedups_everything_previously_routed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(&dir);
    let cfg = open_config();

    let monitors: Vec<Box<dyn Monitor>> = vec![Box::new(StaticMonitor {
        source: SignalSource::Github,
        signals: vec![
            signal("github:1", SignalSource::Github, "first repo"),
            signal("github:2", SignalSource::Github, "second repo"),
            signal("github:3", SignalSource::Github, "third repo"),
        ],
    })];

    let first = run_radar(&cfg, &monitors, &paths).await.unwrap();
    assert_eq!(first.totals.fetched, 3);
    assert_eq!(first.totals.routed, 3);
    assert_eq!(first.totals.deduped, 0);

    let second = run_radar(&cfg, &monitors, &paths).await.unwrap();
    assert_eq!(second.totals.routed, 0);
    assert_eq!(second.totals.deduped, 3);
    assert_eq!(second.cache_size, 3);
}

#[tokio::test]
async fn excluded_keyword_drops_before_scoring_without_counting() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(&dir);
    let cfg = AppConfig {
        filters: FiltersConfig {
            include: vec![],
            exclude: vec!["nft".into()],
        },
        ..Default::default()
    };

    let monitors: Vec<Box<dyn Monitor>> = vec![Box::new(StaticMonitor {
        source: SignalSource::Twitter,
        signals: vec![signal(
            "twitter:drop-me",
            SignalSource::Twitter,
            "Hot new NFT drop with huge engagement",
        )],
    })];

    let summary = run_radar(&cfg, &monitors, &paths).await.unwrap();
    assert_eq!(summary.totals.fetched, 1);
    // The drop is silent: neither deduped nor routed moves.
    assert_eq!(summary.totals.deduped, 0);
    assert_eq!(summary.totals.routed, 0);
    assert_eq!(summary.cache_size, 0);
}

#[tokio::test]
async fn one_failing_monitor_never_aborts_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(&dir);
    let cfg = open_config();

    let monitors: Vec<Box<dyn Monitor>> = vec![
        Box::new(FailingMonitor(SignalSource::Hackernews)),
        Box::new(StaticMonitor {
            source: SignalSource::Youtube,
            signals: vec![signal("youtube:v1", SignalSource::Youtube, "a video")],
        }),
    ];

    let summary = run_radar(&cfg, &monitors, &paths).await.unwrap();
    assert_eq!(summary.totals.errors, 1);
    assert_eq!(summary.totals.routed, 1);

    // Partial failure is still a successful run.
    assert!(!run_failed(&summary.results));
}

#[tokio::test]
async fn run_fails_only_when_every_monitor_errors() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(&dir);
    let cfg = open_config();

    let monitors: Vec<Box<dyn Monitor>> = vec![
        Box::new(FailingMonitor(SignalSource::Hackernews)),
        Box::new(FailingMonitor(SignalSource::Github)),
    ];

    let summary = run_radar(&cfg, &monitors, &paths).await.unwrap();
    assert_eq!(summary.totals.errors, 2);
    assert!(run_failed(&summary.results));
}

#[tokio::test]
async fn run_summary_is_persisted_with_queue_stats() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths_in(&dir);
    let cfg = open_config();

    let monitors: Vec<Box<dyn Monitor>> = vec![Box::new(StaticMonitor {
        source: SignalSource::Github,
        signals: vec![signal("github:1", SignalSource::Github, "a repo")],
    })];

    run_radar(&cfg, &monitors, &paths).await.unwrap();

    let raw = std::fs::read_to_string(paths.logs_dir.join(RUN_SUMMARY_FILE)).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(summary["totals"]["fetched"], serde_json::json!(1));
    assert_eq!(summary["cacheSize"], serde_json::json!(1));
    // Every signal lands in `all` regardless of score band.
    assert_eq!(summary["queues"]["all"]["total"], serde_json::json!(1));
    assert!(summary["results"].as_array().unwrap().len() == 1);
}
