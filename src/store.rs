// src/store.rs
//! Persistence of the daily per-category result maps.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::types::Category;
use crate::trend::TrendItem;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store credentials are missing: {0}")]
    CredentialsMissing(&'static str),
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("store payload encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trend items of one category keyed by trend id.
pub type TrendMap = BTreeMap<String, TrendItem>;

/// How the collection window evolved during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub lookback_days: u32,
    pub lookback_history: Vec<u32>,
    pub rounds: u32,
    pub collected_at: DateTime<Utc>,
}

/// One row per run date. The category maps are keyed by id; `ranking` holds
/// the same ids per category in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub run_date: NaiveDate,
    pub products: TrendMap,
    pub research: TrendMap,
    pub infra: TrendMap,
    #[serde(default)]
    pub ranking: BTreeMap<Category, Vec<String>>,
    pub trend_window: Option<TrendWindow>,
    pub updated_at: DateTime<Utc>,
}

impl DailyRecord {
    /// Split ranked items into the three category maps.
    pub fn from_ranked(
        run_date: NaiveDate,
        ranked: &[TrendItem],
        trend_window: Option<TrendWindow>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut rec = Self {
            run_date,
            products: TrendMap::new(),
            research: TrendMap::new(),
            infra: TrendMap::new(),
            ranking: BTreeMap::new(),
            trend_window,
            updated_at,
        };
        for item in ranked {
            let map = rec.map_mut(item.category);
            if map.insert(item.id.clone(), item.clone()).is_none() {
                rec.ranking.entry(item.category).or_default().push(item.id.clone());
            }
        }
        rec
    }

    pub fn map(&self, category: Category) -> &TrendMap {
        match category {
            Category::Product => &self.products,
            Category::Research => &self.research,
            Category::Infra => &self.infra,
        }
    }

    fn map_mut(&mut self, category: Category) -> &mut TrendMap {
        match category {
            Category::Product => &mut self.products,
            Category::Research => &mut self.research,
            Category::Infra => &mut self.infra,
        }
    }

    /// Items of one category in rank order.
    pub fn ranked(&self, category: Category) -> Vec<&TrendItem> {
        let map = self.map(category);
        self.ranking
            .get(&category)
            .map(|ids| ids.iter().filter_map(|id| map.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.products.len() + self.research.len() + self.infra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
pub trait TrendStore: Send + Sync {
    /// Upsert the record for `record.run_date`.
    async fn persist(&self, record: &DailyRecord) -> Result<(), StoreError>;

    async fn record_exists(&self, run_date: NaiveDate) -> Result<bool, StoreError>;

    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// Supabase (PostgREST)
// ------------------------------------------------------------

/// Credentials are checked at first use, not at construction.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: Option<String>,
    secret_key: Option<String>,
    table: String,
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SupabaseStore {
    pub fn from_env(timeout: Duration) -> Self {
        Self::new(
            non_empty_env("SUPABASE_URL"),
            non_empty_env("SUPABASE_SECRET_KEY"),
            non_empty_env("SUPABASE_TABLE").unwrap_or_else(|| "tech_trends".to_string()),
            timeout,
        )
    }

    pub fn new(
        base_url: Option<String>,
        secret_key: Option<String>,
        table: String,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tech-trends/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            secret_key,
            table,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), StoreError> {
        let url = self
            .base_url
            .as_deref()
            .ok_or(StoreError::CredentialsMissing("SUPABASE_URL"))?;
        let key = self
            .secret_key
            .as_deref()
            .ok_or(StoreError::CredentialsMissing("SUPABASE_SECRET_KEY"))?;
        Ok((url, key))
    }

    fn table_url(&self, base: &str) -> String {
        format!("{base}/rest/v1/{}", self.table)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}

#[async_trait::async_trait]
impl TrendStore for SupabaseStore {
    async fn persist(&self, record: &DailyRecord) -> Result<(), StoreError> {
        let (base, key) = self.credentials()?;
        let body = serde_json::to_vec(record)?;
        let resp = self
            .http
            .post(self.table_url(base))
            .query(&[("on_conflict", "run_date")])
            .header("apikey", key)
            .bearer_auth(key)
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .body(body)
            .send()
            .await?;
        check_status(resp).await?;
        tracing::info!(
            target: "store",
            table = %self.table,
            run_date = %record.run_date,
            items = record.len(),
            "daily record upserted"
        );
        Ok(())
    }

    async fn record_exists(&self, run_date: NaiveDate) -> Result<bool, StoreError> {
        let (base, key) = self.credentials()?;
        let resp = self
            .http
            .get(self.table_url(base))
            .query(&[
                ("select", "run_date".to_string()),
                ("run_date", format!("eq.{run_date}")),
                ("limit", "1".to_string()),
            ])
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = check_status(resp).await?.json().await?;
        Ok(!rows.is_empty())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

// ------------------------------------------------------------
// In-memory
// ------------------------------------------------------------

/// Keeps records in process; used for dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<NaiveDate, DailyRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A writer that panicked mid-insert leaves the map itself intact.
    fn records(&self) -> MutexGuard<'_, BTreeMap<NaiveDate, DailyRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, run_date: NaiveDate) -> Option<DailyRecord> {
        self.records().get(&run_date).cloned()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl TrendStore for MemoryStore {
    async fn persist(&self, record: &DailyRecord) -> Result<(), StoreError> {
        self.records().insert(record.run_date, record.clone());
        Ok(())
    }

    async fn record_exists(&self, run_date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.records().contains_key(&run_date))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, category: Category) -> TrendItem {
        TrendItem {
            id: id.into(),
            category,
            title: id.into(),
            source: "S".into(),
            url: format!("https://s.test/{id}"),
            published_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            summary: None,
            reference_count: 1,
            impact_score: 40.0,
            trending_score: 0.5,
            source_references: vec!["S".into()],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn record_splits_by_category() {
        let rec = DailyRecord::from_ranked(
            date(),
            &[
                item("a", Category::Product),
                item("b", Category::Infra),
                item("c", Category::Product),
            ],
            None,
            Utc::now(),
        );
        assert_eq!(rec.products.len(), 2);
        assert_eq!(rec.infra.len(), 1);
        assert!(rec.research.is_empty());
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn record_serializes_with_iso_run_date() {
        let rec = DailyRecord::from_ranked(date(), &[], None, Utc::now());
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["run_date"], "2025-03-01");
        assert!(v["trend_window"].is_null());
        assert!(v["products"].as_object().unwrap().is_empty());
    }

    #[test]
    fn ranking_keeps_rank_order_through_json() {
        // Ids sort differently from rank.
        let ranked = [
            item("zeta", Category::Product),
            item("alpha", Category::Product),
            item("mid", Category::Infra),
            item("beta", Category::Product),
        ];
        let rec = DailyRecord::from_ranked(date(), &ranked, None, Utc::now());
        assert_eq!(rec.ranking[&Category::Product], vec!["zeta", "alpha", "beta"]);
        assert!(!rec.ranking.contains_key(&Category::Research));

        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["ranking"]["product"][0], "zeta");
        let back: DailyRecord = serde_json::from_value(v).unwrap();
        let titles: Vec<_> = back
            .ranked(Category::Product)
            .into_iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["zeta", "alpha", "beta"]);
        assert_eq!(back.ranked(Category::Infra).len(), 1);
    }

    #[tokio::test]
    async fn memory_store_survives_a_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let s = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = s.records.lock().unwrap();
            panic!("writer died");
        })
        .join();
        assert!(store.records.is_poisoned());

        let rec = DailyRecord::from_ranked(date(), &[item("a", Category::Infra)], None, Utc::now());
        store.persist(&rec).await.unwrap();
        assert!(store.record_exists(date()).await.unwrap());
        assert_eq!(store.get(date()).unwrap().infra.len(), 1);
    }

    #[tokio::test]
    async fn supabase_without_credentials_fails_at_first_use() {
        let store = SupabaseStore::new(None, None, "t".into(), Duration::from_secs(1));
        let err = store.record_exists(date()).await.unwrap_err();
        assert!(matches!(err, StoreError::CredentialsMissing("SUPABASE_URL")));

        let store = SupabaseStore::new(
            Some("https://x.test".into()),
            None,
            "t".into(),
            Duration::from_secs(1),
        );
        let rec = DailyRecord::from_ranked(date(), &[], None, Utc::now());
        let err = store.persist(&rec).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::CredentialsMissing("SUPABASE_SECRET_KEY")
        ));
    }

    #[tokio::test]
    async fn memory_store_upserts_by_date() {
        let store = MemoryStore::new();
        assert!(!store.record_exists(date()).await.unwrap());
        let rec = DailyRecord::from_ranked(date(), &[item("a", Category::Research)], None, Utc::now());
        store.persist(&rec).await.unwrap();
        store.persist(&rec).await.unwrap();
        assert!(store.record_exists(date()).await.unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(date()).unwrap().research.len(), 1);
    }
}
