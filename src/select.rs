// src/select.rs
//! Fair round-robin selection across the sources of one group.
//!
//! A diversity phase first takes one item from as many distinct sources as the
//! floor asks for; a fill phase then sweeps all sources round-robin. Both phases
//! honour the per-source cap, admit items through the session [`Deduplicator`],
//! and stop after a sweep that makes no progress.

use std::collections::HashMap;

use crate::dedup::Deduplicator;
use crate::sources::types::SourceItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectLimits {
    pub max_items: usize,
    pub min_unique_domains: usize,
    pub max_items_per_source: usize,
}

/// Per-source read position plus the number of items taken from it.
struct Cursor {
    items: Vec<SourceItem>,
    next: usize,
    taken: usize,
}

impl Cursor {
    /// Advance to the next item the deduplicator accepts.
    fn pull(&mut self, dedup: &mut Deduplicator) -> Option<SourceItem> {
        while self.next < self.items.len() {
            let idx = self.next;
            self.next += 1;
            if dedup.admit(&self.items[idx]) {
                self.taken += 1;
                return Some(self.items[idx].clone());
            }
        }
        None
    }

    fn exhausted(&self) -> bool {
        self.next >= self.items.len()
    }
}

pub fn select(
    mut items_by_source: HashMap<String, Vec<SourceItem>>,
    source_order: &[String],
    limits: SelectLimits,
    dedup: &mut Deduplicator,
) -> Vec<SourceItem> {
    let mut selected = Vec::new();
    if limits.max_items == 0 || limits.max_items_per_source == 0 {
        return selected;
    }

    // Sources listed twice in `source_order` share one cursor.
    let mut order: Vec<&str> = Vec::with_capacity(source_order.len());
    let mut cursors: HashMap<&str, Cursor> = HashMap::new();
    for name in source_order {
        if cursors.contains_key(name.as_str()) {
            continue;
        }
        let items = items_by_source.remove(name).unwrap_or_default();
        order.push(name.as_str());
        cursors.insert(
            name.as_str(),
            Cursor {
                items,
                next: 0,
                taken: 0,
            },
        );
    }

    let nonempty = cursors.values().filter(|c| !c.items.is_empty()).count();
    let target_unique = limits
        .min_unique_domains
        .min(nonempty)
        .min(limits.max_items);

    // Diversity phase: at most one item per unrepresented source per sweep.
    let mut represented = 0usize;
    let mut is_represented: HashMap<&str, bool> = HashMap::new();
    while represented < target_unique && selected.len() < limits.max_items {
        let mut progressed = false;
        for name in &order {
            if represented >= target_unique || selected.len() >= limits.max_items {
                break;
            }
            if is_represented.get(name).copied().unwrap_or(false) {
                continue;
            }
            let Some(cur) = cursors.get_mut(name) else {
                continue;
            };
            if cur.taken >= limits.max_items_per_source || cur.exhausted() {
                continue;
            }
            if let Some(item) = cur.pull(dedup) {
                selected.push(item);
                is_represented.insert(*name, true);
                represented += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    // Fill phase: plain round-robin under the per-source cap.
    while selected.len() < limits.max_items {
        let mut progressed = false;
        for name in &order {
            if selected.len() >= limits.max_items {
                break;
            }
            let Some(cur) = cursors.get_mut(name) else {
                continue;
            };
            if cur.taken >= limits.max_items_per_source || cur.exhausted() {
                continue;
            }
            if let Some(item) = cur.pull(dedup) {
                selected.push(item);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    tracing::debug!(
        target: "collect",
        selected = selected.len(),
        represented,
        target_unique,
        sources = order.len(),
        "fair selection done"
    );
    selected
}
