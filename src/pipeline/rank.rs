// src/pipeline/rank.rs
use super::state::{PipelineState, Stage};
use super::Pipeline;
use crate::quota;
use crate::scoring::{acquire_reference_counts, trending_score, LookupBudget};
use crate::trend::TrendItem;

/// Score screened items and apply the per-category cap.
pub(crate) async fn rank(p: &Pipeline, mut state: PipelineState) -> PipelineState {
    let cfg = &p.config;
    let now = state.collected_at;
    let scoring_enabled = cfg.compute_trending_score;

    let trends: Vec<TrendItem> = if scoring_enabled {
        let budget = LookupBudget {
            max_lookups: cfg.max_reference_lookups,
            workers: cfg.reference_workers,
            timeout: cfg.request_timeout,
        };
        let counts = acquire_reference_counts(
            &state.screened,
            &state.dedup,
            p.references.as_ref(),
            budget,
            now,
        )
        .await;
        state.errors.extend(counts.errors);
        state
            .screened
            .iter()
            .zip(counts.counts)
            .map(|(item, rc)| {
                let score = trending_score(rc, item.published_at, now, cfg.half_life_days);
                TrendItem::from_source(item, rc, score, state.dedup.sources_for(&item.title), now)
            })
            .collect()
    } else {
        state
            .screened
            .iter()
            .map(|item| {
                let rc = state.dedup.corroboration(&item.title) as u32;
                TrendItem::from_source(item, rc, 0.0, state.dedup.sources_for(&item.title), now)
            })
            .collect()
    };

    let scored = trends.len();
    state.assessed = quota::enforce(trends, cfg.max_trends_per_category, scoring_enabled);

    tracing::info!(
        target: "score",
        scoring_enabled,
        scored,
        kept = state.assessed.len(),
        cap = cfg.max_trends_per_category,
        "ranking finished"
    );

    state.stage = Stage::Storing;
    state
}
