//! signal-radar — Binary Entrypoint
//! One batch pass: run every enabled monitor (or one, with `--monitor=`),
//! dedup, score and route the results, persist the run summary, and exit.
//!
//! Exit code 0 unless every monitor for the run reported at least one error.

use anyhow::{bail, Result};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use signal_radar::config;
use signal_radar::monitors::build_monitors;
use signal_radar::pipeline::{run_failed, run_radar, PipelinePaths};
use signal_radar::signal::SignalSource;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("signal_radar=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// `--monitor=<github|hackernews|youtube|twitter>` restricts the run to one
/// source. An unknown name is a contract violation: abort before any work.
fn parse_monitor_arg(args: impl Iterator<Item = String>) -> Result<Option<SignalSource>> {
    for arg in args {
        if let Some(value) = arg.strip_prefix("--monitor=") {
            return match SignalSource::parse(value) {
                Some(source) => Ok(Some(source)),
                None => bail!("unknown monitor: {value}"),
            };
        }
    }
    Ok(None)
}

async fn run() -> Result<bool> {
    let only = parse_monitor_arg(std::env::args().skip(1))?;
    let cfg = config::load_config(&config::config_path());
    let monitors = build_monitors(&cfg.monitors, only);
    if monitors.is_empty() {
        bail!("no monitors selected");
    }

    let paths = PipelinePaths::default();
    let summary = run_radar(&cfg, &monitors, &paths).await?;
    Ok(run_failed(&summary.results))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op where the environment is already set.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => {
            error!("every monitor reported errors this run");
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = ?e, "radar run crashed");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_arg_parses_known_sources() {
        let got = parse_monitor_arg(vec!["--monitor=youtube".to_string()].into_iter()).unwrap();
        assert_eq!(got, Some(SignalSource::Youtube));

        let none = parse_monitor_arg(vec!["--verbose".to_string()].into_iter()).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn unknown_monitor_is_fatal_before_any_work() {
        assert!(parse_monitor_arg(vec!["--monitor=reddit".to_string()].into_iter()).is_err());
    }
}
