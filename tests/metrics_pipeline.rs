// tests/metrics_pipeline.rs
#![cfg(feature = "strict-metrics")]
mod common;

use std::sync::Arc;

use common::*;
use tech_trends::metrics::Metrics;
use tech_trends::pipeline::Pipeline;
use tech_trends::sources::{Category, SourceFetcher, SourceItem};
use tech_trends::store::MemoryStore;
use tech_trends::PipelineConfig;

#[tokio::test]
async fn metrics_exposed_after_run() {
    // Install the recorder for this test process
    let metrics = Metrics::init().expect("recorder");

    let ok: Arc<dyn SourceFetcher> = StaticSource::new(
        "Alpha",
        vec![SourceItem::new("Model X Launches", "https://alpha.test/x", "Alpha").published(now())],
    );
    let bad: Arc<dyn SourceFetcher> = Arc::new(FailingSource("Down".into()));
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        vec![group("g", Category::Product, vec![ok, bad])],
        Arc::new(MemoryStore::new()),
    )
    .with_reference_counter(FixedCounter::new(&[]));
    pipeline.run_at(run_date(), now()).await.unwrap();

    let out = metrics.render();
    for series in [
        "trends_items_fetched_total",
        "trends_items_selected_total",
        "trends_source_errors_total",
        "trends_reference_lookups_total",
        "trends_reference_fallbacks_total",
        "trends_rounds_total",
        "trends_pipeline_last_run_ts",
    ] {
        assert!(out.contains(series), "missing {series} in:\n{out}");
    }

    // The recorder must see the values, not only the descriptions.
    let fetched: f64 = out
        .lines()
        .find_map(|l| l.strip_prefix("trends_items_fetched_total "))
        .and_then(|v| v.trim().parse().ok())
        .expect("fetched sample");
    assert!(fetched >= 1.0, "fetched = {fetched}");

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("textfile/trends.prom");
    metrics.write_textfile(&path).unwrap();
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .contains("trends_rounds_total"));
}
