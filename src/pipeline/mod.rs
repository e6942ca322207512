// src/pipeline/mod.rs
//! Collection-and-scoring run as an explicit state machine:
//! `Collecting -> Screening -> Deciding -> (Collecting | Scoring) -> Storing -> Done`.

mod collect;
pub mod decide;
mod rank;
mod screening;
pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use metrics::gauge;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::references::DynReferenceCounter;
use crate::screen::{DynScreener, HeuristicScreener};
use crate::sources::types::{Category, SourceGroup};
use crate::store::{DailyRecord, TrendStore, TrendWindow};
use crate::trend::TrendItem;

pub use decide::StopReason;
pub use state::{PipelineState, Stage};

/// Collaborators and settings for runs. Cheap to share across runs.
pub struct Pipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) groups: Vec<SourceGroup>,
    pub(crate) screener: DynScreener,
    pub(crate) references: Option<DynReferenceCounter>,
    pub(crate) store: Arc<dyn TrendStore>,
}

/// Outcome of one run, successful or skipped.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_date: NaiveDate,
    /// Set when an existing record suppressed the run.
    pub skipped: bool,
    /// Set when a record was written; runs that assessed nothing write none.
    pub persisted: bool,
    pub rounds: u32,
    pub lookback_days: u32,
    pub lookback_history: Vec<u32>,
    /// Everything the sources returned, before selection and dedup.
    pub fetched_count: usize,
    pub raw_count: usize,
    pub screened_count: usize,
    pub discarded_count: usize,
    pub assessed_count: usize,
    pub per_category: BTreeMap<Category, usize>,
    pub errors: Vec<String>,
    pub items: Vec<TrendItem>,
}

impl RunReport {
    fn skipped(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            skipped: true,
            persisted: false,
            rounds: 0,
            lookback_days: 0,
            lookback_history: Vec::new(),
            fetched_count: 0,
            raw_count: 0,
            screened_count: 0,
            discarded_count: 0,
            assessed_count: 0,
            per_category: BTreeMap::new(),
            errors: Vec::new(),
            items: Vec::new(),
        }
    }

    fn from_state(run_date: NaiveDate, state: PipelineState) -> Self {
        let mut per_category = BTreeMap::new();
        for item in &state.assessed {
            *per_category.entry(item.category).or_insert(0) += 1;
        }
        Self {
            run_date,
            skipped: false,
            persisted: state.persisted,
            rounds: state.round,
            lookback_days: state.lookback_days,
            lookback_history: state.lookback_history,
            fetched_count: state.fetched,
            raw_count: state.raw_items.len(),
            screened_count: state.screened.len(),
            discarded_count: state.discarded,
            assessed_count: state.assessed.len(),
            per_category,
            errors: state.errors,
            items: state.assessed,
        }
    }
}

impl Pipeline {
    /// Defaults: keyword screener, corroboration-only reference counts.
    pub fn new(config: PipelineConfig, groups: Vec<SourceGroup>, store: Arc<dyn TrendStore>) -> Self {
        Self {
            config,
            groups,
            screener: Arc::new(HeuristicScreener),
            references: None,
            store,
        }
    }

    pub fn with_screener(mut self, screener: DynScreener) -> Self {
        self.screener = screener;
        self
    }

    pub fn with_reference_counter(mut self, counter: DynReferenceCounter) -> Self {
        self.references = Some(counter);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    pub async fn run(&self, run_date: NaiveDate) -> Result<RunReport> {
        self.run_at(run_date, Utc::now()).await
    }

    /// Run with an explicit collection timestamp (scores age against it).
    pub async fn run_at(&self, run_date: NaiveDate, collected_at: DateTime<Utc>) -> Result<RunReport> {
        crate::metrics::ensure_described();

        if !self.config.overwrite_execution {
            let exists = self
                .store
                .record_exists(run_date)
                .await
                .with_context(|| format!("checking {} for {run_date}", self.store.name()))?;
            if exists {
                tracing::info!(target: "store", %run_date, "record exists and overwrite is off; skipping run");
                return Ok(RunReport::skipped(run_date));
            }
        }

        let mut state = PipelineState::new(self.config.default_lookback_days, collected_at);
        loop {
            let stage = state.stage;
            state = match stage {
                Stage::Collecting => collect::collect(self, state).await,
                Stage::Screening => screening::screen(self, state).await,
                Stage::Deciding => decide::decide(&self.config, state),
                Stage::Scoring => rank::rank(self, state).await,
                Stage::Storing => self.persist(run_date, state).await?,
                Stage::Done => break,
            };
        }

        gauge!("trends_pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        Ok(RunReport::from_state(run_date, state))
    }

    async fn persist(&self, run_date: NaiveDate, mut state: PipelineState) -> Result<PipelineState> {
        state.stage = Stage::Done;
        if state.assessed.is_empty() {
            // An empty run must not replace an earlier record for the same date.
            tracing::warn!(
                target: "store",
                %run_date,
                errors = state.errors.len(),
                "nothing assessed; leaving the store untouched"
            );
            return Ok(state);
        }

        let window = TrendWindow {
            lookback_days: state.lookback_days,
            lookback_history: state.lookback_history.clone(),
            rounds: state.round,
            collected_at: state.collected_at,
        };
        let record = DailyRecord::from_ranked(run_date, &state.assessed, Some(window), Utc::now());
        self.store
            .persist(&record)
            .await
            .with_context(|| format!("persisting {run_date} to {}", self.store.name()))?;
        tracing::info!(
            target: "store",
            store = self.store.name(),
            %run_date,
            products = record.products.len(),
            research = record.research.len(),
            infra = record.infra.len(),
            "run persisted"
        );
        state.persisted = true;
        Ok(state)
    }
}
