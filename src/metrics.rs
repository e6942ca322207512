// src/metrics.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series carry descriptions in the exposition).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("trends_items_fetched_total", "Raw items returned by sources.");
        describe_counter!(
            "trends_items_selected_total",
            "Items admitted by the fair selector and dedup."
        );
        describe_counter!(
            "trends_items_discarded_total",
            "Items dropped by relevance screening."
        );
        describe_counter!("trends_source_errors_total", "Source fetch failures.");
        describe_counter!(
            "trends_reference_lookups_total",
            "External reference-count lookups attempted."
        );
        describe_counter!(
            "trends_reference_fallbacks_total",
            "Lookups that fell back to the corroboration count."
        );
        describe_counter!("trends_rounds_total", "Collection rounds executed.");
        describe_histogram!("trends_fetch_ms", "Feed fetch time in milliseconds.");
        describe_gauge!(
            "trends_pipeline_last_run_ts",
            "Unix ts when the pipeline last finished."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the exposition for a textfile collector: temp file, then rename.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = path.with_extension("prom.tmp");
        fs::write(&tmp, self.render()).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("renaming to {}", path.display()))?;
        Ok(())
    }
}
