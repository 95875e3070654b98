//! pipeline.rs — one radar pass: fetch → filter → dedup → score → route.
//!
//! Monitors run sequentially (external APIs dislike fan-out) and are
//! isolated from each other: one source failing never aborts the rest.
//! The run only counts as failed when every monitor reported at least one
//! error.

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::monitors::Monitor;
use crate::router::QueueRouter;
use crate::scorer::SignalScorer;
use crate::signal::{MonitorReport, Signal};
use crate::storage::cache::DedupCache;
use crate::storage::queue::{QueueName, QueueStats, QueueStore};

pub const RUN_SUMMARY_FILE: &str = "last-run.json";

/// One-time metrics registration so the series carry descriptions.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("radar_fetched_total", "Signals fetched from monitors.");
        describe_counter!("radar_filtered_total", "Signals dropped by keyword filter.");
        describe_counter!("radar_deduped_total", "Signals skipped as already processed.");
        describe_counter!("radar_routed_total", "Signals scored and routed to queues.");
        describe_counter!("radar_monitor_errors_total", "Monitor fetch/processing errors.");
        describe_gauge!("radar_last_run_ts", "Unix ts of the last completed radar run.");
    });
}

/// Where one run keeps its durable state.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    /// Queue logs + dedup cache.
    pub queues_dir: PathBuf,
    /// Run summary.
    pub logs_dir: PathBuf,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            queues_dir: PathBuf::from("queues"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub fetched: usize,
    pub deduped: usize,
    pub routed: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub timestamp: String,
    pub totals: RunTotals,
    pub results: Vec<MonitorReport>,
    pub queues: BTreeMap<QueueName, QueueStats>,
    pub cache_size: usize,
}

/// Keyword gate applied before scoring. Exclusions are checked first and
/// short-circuit; with no include keywords configured everything not
/// excluded passes, otherwise at least one include keyword must match.
pub fn keep_signal(signal: &Signal, include: &[String], exclude: &[String]) -> bool {
    let body = format!(
        "{} {}",
        signal.title.as_deref().unwrap_or_default(),
        signal.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    if exclude.iter().any(|term| body.contains(&term.to_lowercase())) {
        return false;
    }
    if include.is_empty() {
        return true;
    }
    include.iter().any(|term| body.contains(&term.to_lowercase()))
}

/// True when the run as a whole should signal failure: every monitor that
/// ran reported at least one error.
pub fn run_failed(results: &[MonitorReport]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.errors > 0)
}

/// Drive one pass over all monitors and persist the run summary.
pub async fn run_radar(
    cfg: &AppConfig,
    monitors: &[Box<dyn Monitor>],
    paths: &PipelinePaths,
) -> Result<RunSummary> {
    ensure_metrics_described();
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("creating {}", paths.logs_dir.display()))?;

    let mut cache = DedupCache::open(&paths.queues_dir)?;
    let store = QueueStore::open(&paths.queues_dir, cfg.scoring.thresholds)?;
    let scorer = SignalScorer::new(cfg.scoring.rubric.clone(), cfg.scoring.thresholds);
    let router = QueueRouter::new(&store);

    let mut results = Vec::with_capacity(monitors.len());

    for monitor in monitors {
        let name = monitor.name();
        let mut report = MonitorReport::new(name);
        info!(monitor = %name, "running monitor");

        match monitor.fetch().await {
            Ok(signals) => {
                report.fetched = signals.len();
                counter!("radar_fetched_total").increment(signals.len() as u64);

                for signal in signals {
                    if !keep_signal(&signal, &cfg.filters.include, &cfg.filters.exclude) {
                        counter!("radar_filtered_total").increment(1);
                        continue;
                    }
                    if cache.has(&signal.id) {
                        report.deduped += 1;
                        counter!("radar_deduped_total").increment(1);
                        continue;
                    }

                    let scored = scorer.score(&signal);
                    match router.route(scored) {
                        Ok(route) => {
                            cache.add(&signal.id, signal.source)?;
                            report.routed += 1;
                            counter!("radar_routed_total").increment(1);
                            info!(
                                monitor = %name,
                                signal = %route.signal_id,
                                queue = %route.queue,
                                action = %route.action,
                                score = route.score,
                                "signal routed"
                            );
                        }
                        Err(e) => {
                            report.errors += 1;
                            counter!("radar_monitor_errors_total").increment(1);
                            warn!(monitor = %name, signal = %signal.id, error = ?e, "routing failed");
                        }
                    }
                }
            }
            Err(e) => {
                report.errors += 1;
                counter!("radar_monitor_errors_total").increment(1);
                error!(monitor = %name, error = ?e, "monitor failed");
            }
        }

        results.push(report);
    }

    let totals = results.iter().fold(RunTotals::default(), |mut acc, r| {
        acc.fetched += r.fetched;
        acc.deduped += r.deduped;
        acc.routed += r.routed;
        acc.errors += r.errors;
        acc
    });

    let summary = RunSummary {
        timestamp: Utc::now().to_rfc3339(),
        totals,
        results,
        queues: store.stats()?,
        cache_size: cache.len(),
    };

    let summary_path = paths.logs_dir.join(RUN_SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    gauge!("radar_last_run_ts").set(Utc::now().timestamp() as f64);
    info!(
        fetched = totals.fetched,
        deduped = totals.deduped,
        routed = totals.routed,
        errors = totals.errors,
        "radar run complete"
    );

    Ok(summary)
}
