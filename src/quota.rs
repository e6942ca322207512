// src/quota.rs
//! Final ranking: title-level dedup across rounds, global sort, per-category cap.

use std::collections::HashMap;

use crate::normalize::title_key;
use crate::sources::types::Category;
use crate::trend::TrendItem;

/// Whether `challenger` should replace `incumbent` for the same normalized title.
fn supersedes(challenger: &TrendItem, incumbent: &TrendItem, scoring_enabled: bool) -> bool {
    if scoring_enabled {
        challenger.trending_score > incumbent.trending_score
    } else {
        challenger.published_at > incumbent.published_at
    }
}

/// Collapse same-title items. A strictly better late arrival takes the slot of the
/// earlier one; ties keep the first seen.
pub fn dedupe_by_title(items: Vec<TrendItem>, scoring_enabled: bool) -> Vec<TrendItem> {
    let mut slots: Vec<TrendItem> = Vec::with_capacity(items.len());
    let mut by_title: HashMap<String, usize> = HashMap::new();
    for item in items {
        let key = title_key(&item.title);
        match by_title.get(&key) {
            Some(&idx) => {
                if supersedes(&item, &slots[idx], scoring_enabled) {
                    slots[idx] = item;
                }
            }
            None => {
                by_title.insert(key, slots.len());
                slots.push(item);
            }
        }
    }
    slots
}

pub fn enforce(
    scored_items: Vec<TrendItem>,
    per_category_cap: usize,
    scoring_enabled: bool,
) -> Vec<TrendItem> {
    let mut ranked = dedupe_by_title(scored_items, scoring_enabled);

    // Stable sorts: equal keys keep insertion order.
    if scoring_enabled {
        ranked.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
    } else {
        ranked.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }

    let mut per_category: HashMap<Category, usize> = HashMap::new();
    let budget = per_category_cap.saturating_mul(Category::ALL.len());
    let mut out = Vec::with_capacity(ranked.len().min(budget));
    for item in ranked {
        let n = per_category.entry(item.category).or_insert(0);
        if *n >= per_category_cap {
            continue;
        }
        *n += 1;
        out.push(item);
    }
    out
}
