// tests/common/mod.rs
// Mock collaborators shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use tech_trends::references::{ReferenceCount, ReferenceCounter};
use tech_trends::screen::{ScreenDecision, Screener};
use tech_trends::sources::{Category, SourceFetcher, SourceGroup, SourceItem};
use tech_trends::store::{DailyRecord, StoreError, TrendStore};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap()
}

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

/// Returns the same items on every fetch and counts calls.
pub struct StaticSource {
    pub name: String,
    pub items: Vec<SourceItem>,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(name: &str, items: Vec<SourceItem>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            items,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _lookback_days: u32) -> Result<Vec<SourceItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

/// Always fails.
pub struct FailingSource(pub String);

#[async_trait]
impl SourceFetcher for FailingSource {
    fn name(&self) -> &str {
        &self.0
    }

    async fn fetch(&self, _lookback_days: u32) -> Result<Vec<SourceItem>> {
        anyhow::bail!("connection refused")
    }
}

/// Yields brand-new items on every call, so collection never dries up.
pub struct EndlessSource {
    pub name: String,
    pub counter: AtomicUsize,
}

impl EndlessSource {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            counter: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SourceFetcher for EndlessSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _lookback_days: u32) -> Result<Vec<SourceItem>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok((0..2)
            .map(|i| {
                SourceItem::new(
                    format!("{} story {n} {i}", self.name),
                    format!("https://{}.test/{n}/{i}", self.name),
                    self.name.as_str(),
                )
                .published(now())
            })
            .collect())
    }
}

pub fn group(name: &str, category: Category, sources: Vec<Arc<dyn SourceFetcher>>) -> SourceGroup {
    sources
        .into_iter()
        .fold(SourceGroup::new(name, category), |g, s| g.with_source(s))
}

/// Fixed coverage per URL; unknown URLs error.
pub struct FixedCounter {
    pub coverage: Vec<(String, u32)>,
    pub calls: Mutex<Vec<String>>,
}

impl FixedCounter {
    pub fn new(coverage: &[(&str, u32)]) -> Arc<Self> {
        Arc::new(Self {
            coverage: coverage.iter().map(|(u, c)| (u.to_string(), *c)).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ReferenceCounter for FixedCounter {
    async fn count_references(
        &self,
        url: &str,
        _title: Option<&str>,
        _published_at: Option<DateTime<Utc>>,
    ) -> Result<ReferenceCount> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.coverage.iter().find(|(u, _)| u == url) {
            Some((_, c)) => Ok(ReferenceCount {
                coverage_count: *c,
                sample_urls: Vec::new(),
            }),
            None => anyhow::bail!("search quota exhausted"),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

/// Discards titles containing "spam", is unsure about "maybe", errors on "boom",
/// and moves "paper" titles to research.
pub struct RuleScreener;

#[async_trait]
impl Screener for RuleScreener {
    async fn screen(&self, item: &SourceItem) -> Result<ScreenDecision> {
        let t = item.title.to_lowercase();
        if t.contains("boom") {
            anyhow::bail!("model overloaded");
        }
        if t.contains("spam") {
            return Ok(ScreenDecision::discard(0.9, "spam"));
        }
        if t.contains("maybe") {
            return Ok(ScreenDecision::keep(0.4, "unsure"));
        }
        let d = ScreenDecision::keep(0.9, "real development");
        Ok(if t.contains("paper") {
            d.recategorized(Some(Category::Research))
        } else {
            d
        })
    }

    fn provider_name(&self) -> &'static str {
        "rules"
    }
}

/// Store whose writes always fail.
pub struct BrokenStore;

#[async_trait]
impl TrendStore for BrokenStore {
    async fn persist(&self, _record: &DailyRecord) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }

    async fn record_exists(&self, _run_date: NaiveDate) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}
