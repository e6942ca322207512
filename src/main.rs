//! tech-trends: one daily collection-and-scoring run.
//!
//! Usage: `tech-trends [lookback_days]`. Configuration comes from the environment
//! (and `.env`); see `PipelineConfig::from_env` for the variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tech_trends::metrics::Metrics;
use tech_trends::{pipeline_from_env, PipelineConfig};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tech_trends=info,warn"));
    let json = std::env::var("TRENDS_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = Metrics::init()?;

    let mut config = PipelineConfig::from_env();
    if let Some(arg) = std::env::args().nth(1) {
        let days: u32 = arg
            .parse()
            .with_context(|| format!("lookback_days must be a positive integer, got {arg:?}"))?;
        config = config.with_lookback(days);
    }

    let pipeline = pipeline_from_env(config).await?;
    let run_date = Utc::now().date_naive();
    let report = pipeline.run(run_date).await?;

    tracing::info!(
        %run_date,
        skipped = report.skipped,
        persisted = report.persisted,
        rounds = report.rounds,
        lookback_days = report.lookback_days,
        fetched = report.fetched_count,
        raw = report.raw_count,
        screened = report.screened_count,
        assessed = report.assessed_count,
        errors = report.errors.len(),
        "run finished"
    );
    for e in &report.errors {
        tracing::warn!(error = %e, "non-fatal error");
    }

    if let Ok(path) = std::env::var("TRENDS_METRICS_PATH") {
        let path = PathBuf::from(path);
        if let Err(e) = metrics.write_textfile(&path) {
            tracing::warn!(error = ?e, path = %path.display(), "metrics export failed");
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("encoding run report")?
    );
    Ok(())
}
