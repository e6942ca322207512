// src/pipeline/collect.rs
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use metrics::counter;

use super::state::{PipelineState, Stage};
use super::Pipeline;
use crate::pool::{fan_out, with_timeout};
use crate::select::{select, SelectLimits};
use crate::sources::types::{Category, SourceItem};

/// One collection round over every non-exhausted group.
pub(crate) async fn collect(p: &Pipeline, mut state: PipelineState) -> PipelineState {
    state.round += 1;
    state.lookback_history.push(state.lookback_days);
    counter!("trends_rounds_total").increment(1);

    // A category nobody feeds can never contribute.
    for cat in Category::ALL {
        if !p.groups.iter().any(|g| g.category == cat) {
            state.exhausted.insert(cat);
        }
    }

    let active: Vec<usize> = p
        .groups
        .iter()
        .enumerate()
        .filter(|(_, g)| !state.is_exhausted(g.category))
        .map(|(i, _)| i)
        .collect();

    let jobs: Vec<(usize, usize)> = active
        .iter()
        .flat_map(|&gi| (0..p.groups[gi].sources.len()).map(move |si| (gi, si)))
        .collect();

    tracing::info!(
        target: "collect",
        round = state.round,
        lookback_days = state.lookback_days,
        groups = active.len(),
        sources = jobs.len(),
        "collection round started"
    );

    let t0 = Instant::now();
    let lookback = state.lookback_days;
    let limit = p.config.request_timeout;
    let fetched = fan_out(jobs.clone(), p.config.max_workers, |(gi, si)| {
        let src = p.groups[gi].sources[si].clone();
        async move {
            let what = format!("fetch {}", src.name());
            with_timeout(limit, &what, src.fetch(lookback)).await
        }
    })
    .await;

    // Group index → source name → fetched items.
    let mut by_group: HashMap<usize, HashMap<String, Vec<SourceItem>>> = HashMap::new();
    for ((gi, si), res) in jobs.into_iter().zip(fetched) {
        let group = &p.groups[gi];
        let name = group.sources[si].name().to_string();
        match res {
            Ok(mut items) => {
                counter!("trends_items_fetched_total").increment(items.len() as u64);
                state.fetched += items.len();
                for it in &mut items {
                    it.category.get_or_insert(group.category);
                }
                tracing::debug!(target: "collect", source = %name, items = items.len(), "fetched");
                state.dedup.observe(items.iter());
                by_group
                    .entry(gi)
                    .or_default()
                    .entry(name)
                    .or_default()
                    .extend(items);
            }
            Err(e) => {
                counter!("trends_source_errors_total").increment(1);
                tracing::warn!(target: "collect", source = %name, error = %e, "source fetch failed");
                state.record_error(&format!("source {name}"), format!("{e:#}"));
            }
        }
    }

    let limits = SelectLimits {
        max_items: p.config.max_items_per_expert,
        min_unique_domains: p.config.min_unique_domains,
        max_items_per_source: p.config.max_items_per_source,
    };

    let mut added_by_category: BTreeMap<Category, usize> = BTreeMap::new();
    for &gi in &active {
        let group = &p.groups[gi];
        let items_by_source = by_group.remove(&gi).unwrap_or_default();
        let selected = select(
            items_by_source,
            &group.source_order(),
            limits,
            &mut state.dedup,
        );
        tracing::debug!(target: "collect", group = %group.name, selected = selected.len(), "group merged");
        *added_by_category.entry(group.category).or_insert(0) += selected.len();
        state.raw_items.extend(selected.iter().cloned());
        state.pending.extend(selected);
    }

    let active_categories: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|c| !state.is_exhausted(*c))
        .collect();
    for cat in active_categories {
        let added = added_by_category.get(&cat).copied().unwrap_or(0);
        state.record_contribution(cat, added);
    }

    state.last_round_added = added_by_category.values().sum();
    counter!("trends_items_selected_total").increment(state.last_round_added as u64);

    tracing::info!(
        target: "collect",
        round = state.round,
        fetched_total = state.fetched,
        added = state.last_round_added,
        exhausted = ?state.exhausted,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "collection round finished"
    );

    state.stage = Stage::Screening;
    state
}
