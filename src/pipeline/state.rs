// src/pipeline/state.rs
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dedup::Deduplicator;
use crate::sources::types::{Category, SourceItem};
use crate::trend::TrendItem;

/// Consecutive zero-contribution rounds after which a category stops being fetched.
pub const EXHAUSTION_STREAK: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Collecting,
    Screening,
    Deciding,
    Scoring,
    Storing,
    Done,
}

/// Everything a run accumulates. Owned by the orchestrator and moved through
/// each stage; nothing else holds it.
#[derive(Debug)]
pub struct PipelineState {
    pub stage: Stage,
    pub lookback_days: u32,
    pub lookback_history: Vec<u32>,
    pub round: u32,
    /// Items returned by sources across rounds, before selection.
    pub fetched: usize,
    /// Every item admitted by selection + dedup, across rounds.
    pub raw_items: Vec<SourceItem>,
    /// Admitted this round, not yet screened.
    pub pending: Vec<SourceItem>,
    pub screened: Vec<SourceItem>,
    pub discarded: usize,
    pub exhausted: BTreeSet<Category>,
    pub zero_streak: BTreeMap<Category, u32>,
    pub last_round_added: usize,
    pub last_round_by_category: BTreeMap<Category, usize>,
    pub errors: Vec<String>,
    pub assessed: Vec<TrendItem>,
    pub dedup: Deduplicator,
    pub collected_at: DateTime<Utc>,
    pub persisted: bool,
}

impl PipelineState {
    pub fn new(lookback_days: u32, collected_at: DateTime<Utc>) -> Self {
        Self {
            stage: Stage::Collecting,
            lookback_days,
            lookback_history: Vec::new(),
            round: 0,
            fetched: 0,
            raw_items: Vec::new(),
            pending: Vec::new(),
            screened: Vec::new(),
            discarded: 0,
            exhausted: BTreeSet::new(),
            zero_streak: BTreeMap::new(),
            last_round_added: 0,
            last_round_by_category: BTreeMap::new(),
            errors: Vec::new(),
            assessed: Vec::new(),
            dedup: Deduplicator::new(),
            collected_at,
            persisted: false,
        }
    }

    pub fn is_exhausted(&self, category: Category) -> bool {
        self.exhausted.contains(&category)
    }

    pub fn screened_in(&self, category: Category) -> usize {
        self.screened
            .iter()
            .filter(|it| it.category == Some(category))
            .count()
    }

    /// Record one round's contribution for `category` and mark it exhausted after
    /// [`EXHAUSTION_STREAK`] empty rounds in a row.
    pub fn record_contribution(&mut self, category: Category, added: usize) {
        self.last_round_by_category.insert(category, added);
        let streak = self.zero_streak.entry(category).or_insert(0);
        if added == 0 {
            *streak += 1;
        } else {
            *streak = 0;
        }
        if *streak >= EXHAUSTION_STREAK {
            self.exhausted.insert(category);
        }
    }

    pub fn record_error(&mut self, origin: &str, err: impl std::fmt::Display) {
        self.errors.push(format!("{origin}: {err}"));
    }
}
