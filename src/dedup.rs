// src/dedup.rs
//! Session-wide duplicate suppression plus the title → sources corroboration index.
//!
//! One `Deduplicator` lives for a whole collection session (all rounds). It is owned
//! by the orchestrator and only mutated between fan-out phases.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::normalize::{title_key, url_key};
use crate::sources::types::SourceItem;

/// Normalized title → distinct source names that produced it.
pub type TitleReferenceIndex = HashMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen_titles: HashSet<String>,
    seen_urls: HashSet<String>,
    references: TitleReferenceIndex,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an item would be rejected right now (read-only).
    pub fn is_duplicate(&self, item: &SourceItem) -> bool {
        let t = title_key(&item.title);
        let u = url_key(&item.url);
        if t.is_empty() && u.is_empty() {
            return true;
        }
        (!t.is_empty() && self.seen_titles.contains(&t))
            || (!u.is_empty() && self.seen_urls.contains(&u))
    }

    /// Check-and-record a single candidate. Returns `true` if it was accepted.
    ///
    /// The candidate's source is recorded under its title even when the candidate
    /// itself is rejected, so a second outlet carrying the same story corroborates it.
    pub fn admit(&mut self, item: &SourceItem) -> bool {
        let t = title_key(&item.title);
        let u = url_key(&item.url);
        if t.is_empty() && u.is_empty() {
            return false;
        }
        if !t.is_empty() {
            self.references
                .entry(t.clone())
                .or_default()
                .insert(item.source.clone());
        }

        let dup = (!t.is_empty() && self.seen_titles.contains(&t))
            || (!u.is_empty() && self.seen_urls.contains(&u));
        if dup {
            return false;
        }
        if !t.is_empty() {
            self.seen_titles.insert(t);
        }
        if !u.is_empty() {
            self.seen_urls.insert(u);
        }
        true
    }

    /// Batch form of [`admit`](Self::admit); keeps input order.
    pub fn dedupe(&mut self, new_items: Vec<SourceItem>) -> Vec<SourceItem> {
        new_items.into_iter().filter(|it| self.admit(it)).collect()
    }

    /// Record corroboration for items without touching the seen-sets.
    pub fn observe<'a>(&mut self, items: impl IntoIterator<Item = &'a SourceItem>) {
        for item in items {
            let t = title_key(&item.title);
            if t.is_empty() {
                continue;
            }
            self.references
                .entry(t)
                .or_default()
                .insert(item.source.clone());
        }
    }

    /// Drop index entries whose title is not among `kept` so discarded items
    /// do not inflate corroboration counts.
    pub fn prune_references<'a>(&mut self, kept: impl IntoIterator<Item = &'a SourceItem>) {
        let keep: HashSet<String> = kept.into_iter().map(|it| title_key(&it.title)).collect();
        self.references.retain(|title, _| keep.contains(title));
    }

    /// Number of distinct sources that produced `title` (0 if unknown).
    pub fn corroboration(&self, title: &str) -> usize {
        self.references
            .get(&title_key(title))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Sorted corroborating source names for `title`.
    pub fn sources_for(&self, title: &str) -> Vec<String> {
        self.references
            .get(&title_key(title))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn references(&self) -> &TitleReferenceIndex {
        &self.references
    }

    pub fn seen_count(&self) -> (usize, usize) {
        (self.seen_titles.len(), self.seen_urls.len())
    }
}
