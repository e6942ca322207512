// src/scoring.rs
//! Trending score = ln(1 + references) * exp(-age_days / half_life).
//!
//! Reference counts come from an external [`ReferenceCounter`] for a bounded number
//! of the freshest items; everything else uses the corroboration count (distinct
//! sources that carried the same normalized title).

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::dedup::Deduplicator;
use crate::pool::{fan_out, with_timeout};
use crate::references::DynReferenceCounter;
use crate::sources::types::SourceItem;

const SECS_PER_DAY: f64 = 86_400.0;

/// Age in fractional days, never negative. Undated items count as brand new.
pub fn elapsed_days(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published_at {
        Some(at) => (now.signed_duration_since(at).num_seconds() as f64 / SECS_PER_DAY).max(0.0),
        None => 0.0,
    }
}

pub fn trending_score(
    reference_count: u32,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    half_life_days: f64,
) -> f64 {
    let half_life = if half_life_days.is_finite() && half_life_days > 0.0 {
        half_life_days
    } else {
        f64::EPSILON
    };
    let magnitude = (1.0 + reference_count as f64).ln();
    magnitude * (-elapsed_days(published_at, now) / half_life).exp()
}

/// Budget and pool settings for one reference-acquisition pass.
#[derive(Debug, Clone, Copy)]
pub struct LookupBudget {
    pub max_lookups: usize,
    pub workers: usize,
    pub timeout: Duration,
}

/// Reference counts index-aligned with `items`, plus non-fatal lookup errors.
#[derive(Debug, Default)]
pub struct ReferenceCounts {
    pub counts: Vec<u32>,
    pub looked_up: usize,
    pub errors: Vec<String>,
}

/// Lookup order: most recently published first (undated items are treated as `now`),
/// ties in input order.
pub fn lookup_priority(items: &[SourceItem], now: DateTime<Utc>) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..items.len()).collect();
    idx.sort_by(|&a, &b| {
        let pa = items[a].published_at.unwrap_or(now);
        let pb = items[b].published_at.unwrap_or(now);
        pb.cmp(&pa)
    });
    idx
}

pub async fn acquire_reference_counts(
    items: &[SourceItem],
    dedup: &Deduplicator,
    lookup: Option<&DynReferenceCounter>,
    budget: LookupBudget,
    now: DateTime<Utc>,
) -> ReferenceCounts {
    let proxy: Vec<u32> = items
        .iter()
        .map(|it| dedup.corroboration(&it.title).max(1) as u32)
        .collect();

    let Some(lookup) = lookup else {
        return ReferenceCounts {
            counts: proxy,
            looked_up: 0,
            errors: Vec::new(),
        };
    };

    let chosen: Vec<usize> = lookup_priority(items, now)
        .into_iter()
        .take(budget.max_lookups)
        .collect();
    let looked_up = chosen.len();
    tracing::info!(
        target: "score",
        provider = lookup.provider_name(),
        lookups = looked_up,
        proxied = items.len() - looked_up,
        "acquiring reference counts"
    );

    let t0 = Instant::now();
    let results = fan_out(chosen.clone(), budget.workers, |idx| {
        let item = &items[idx];
        let lookup = lookup.clone();
        let limit = budget.timeout;
        async move {
            with_timeout(
                limit,
                "reference lookup",
                lookup.count_references(&item.url, Some(item.title.as_str()), item.published_at),
            )
            .await
        }
    })
    .await;
    counter!("trends_reference_lookups_total").increment(looked_up as u64);

    let mut counts = proxy;
    let mut errors = Vec::new();
    for (idx, res) in chosen.into_iter().zip(results) {
        match res {
            Ok(rc) => counts[idx] = counts[idx].max(rc.coverage_count),
            Err(e) => {
                counter!("trends_reference_fallbacks_total").increment(1);
                tracing::warn!(target: "score", error = %e, url = %items[idx].url, "reference lookup failed; using corroboration");
                errors.push(format!("reference {}: {e:#}", items[idx].url));
            }
        }
    }
    tracing::info!(
        target: "score",
        elapsed_ms = t0.elapsed().as_millis() as u64,
        failed = errors.len(),
        "reference counts ready"
    );

    ReferenceCounts {
        counts,
        looked_up,
        errors,
    }
}
