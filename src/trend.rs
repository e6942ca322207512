// src/trend.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::sources::types::{Category, SourceItem};

/// Final scored entity handed to the store. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendItem {
    pub id: String,
    pub category: Category,
    pub title: String,
    /// Originating publication/source name.
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub summary: Option<String>,
    /// Keyword-based estimate in [0, 100]; informational, not part of ranking.
    pub impact_score: f64,
    pub reference_count: u32,
    pub trending_score: f64,
    pub source_references: Vec<String>,
}

impl TrendItem {
    /// Build from a screened item. A missing publication time becomes `collected_at`;
    /// a missing category falls back to `Category::Product`.
    pub fn from_source(
        item: &SourceItem,
        reference_count: u32,
        trending_score: f64,
        source_references: Vec<String>,
        collected_at: DateTime<Utc>,
    ) -> Self {
        let source_references = if source_references.is_empty() {
            vec![item.source.clone()]
        } else {
            source_references
        };
        let category = item.category.unwrap_or(Category::Product);
        Self {
            id: trend_id(&item.source, &item.title),
            category,
            title: item.title.clone(),
            source: item.source.clone(),
            url: item.url.clone(),
            published_at: item.published_at.unwrap_or(collected_at),
            summary: item.summary.clone(),
            impact_score: impact_score(&item.title, item.summary.as_deref(), category),
            reference_count,
            trending_score,
            source_references,
        }
    }
}

const IMPACT_BASE: f64 = 40.0;
const IMPACT_CAP: f64 = 95.0;

/// Substring weights for announcement-like wording.
const KEYWORD_IMPACT: &[(&str, f64)] = &[
    ("launch", 12.0),
    ("release", 10.0),
    ("open source", 8.0),
    ("benchmark", 10.0),
    ("paper", 8.0),
    ("arxiv", 6.0),
    ("model", 6.0),
    ("inference", 6.0),
    ("agent", 7.0),
    ("changelog", 5.0),
    ("summit", 5.0),
];

/// Heuristic impact: base 40, plus each keyword found in title or summary,
/// plus a category bonus, capped at 95.
pub fn impact_score(title: &str, summary: Option<&str>, category: Category) -> f64 {
    let text = format!("{title} {}", summary.unwrap_or_default()).to_lowercase();
    let keywords: f64 = KEYWORD_IMPACT
        .iter()
        .filter(|(kw, _)| text.contains(kw))
        .map(|(_, w)| w)
        .sum();
    let bonus = match category {
        Category::Research => 6.0,
        Category::Infra => 4.0,
        Category::Product => 0.0,
    };
    (IMPACT_BASE + keywords + bonus).min(IMPACT_CAP)
}

/// Stable content id: hex SHA-256 of `"{source}:{title}"`.
pub fn trend_id(source: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b":");
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
