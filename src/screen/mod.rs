// src/screen/mod.rs
//! Relevance screening: provider abstraction plus a keyword-based default.

pub mod openai;

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::sources::types::{Category, SourceItem};

pub use openai::OpenAiScreener;

/// Keep/discard verdict for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDecision {
    pub keep: bool,
    /// 0.0 ..= 1.0
    pub confidence: f32,
    pub rationale: String,
    /// Category override, when the screener also classifies.
    #[serde(default)]
    pub category: Option<Category>,
}

impl ScreenDecision {
    pub fn keep(confidence: f32, rationale: impl Into<String>) -> Self {
        Self {
            keep: true,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
            category: None,
        }
    }

    pub fn discard(confidence: f32, rationale: impl Into<String>) -> Self {
        Self {
            keep: false,
            ..Self::keep(confidence, rationale)
        }
    }

    pub fn recategorized(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Whether the item passes at `min_confidence`.
    pub fn passes(&self, min_confidence: f32) -> bool {
        self.keep && self.confidence >= min_confidence
    }
}

/// Decides whether a raw item is a meaningful trend.
#[async_trait::async_trait]
pub trait Screener: Send + Sync {
    async fn screen(&self, item: &SourceItem) -> Result<ScreenDecision>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynScreener = Arc<dyn Screener>;

// ------------------------------------------------------------
// Keyword routing
// ------------------------------------------------------------

const RESEARCH_TOKENS: &[&str] = &[
    "paper",
    "arxiv",
    "preprint",
    "benchmark",
    "dataset",
    "theorem",
    "sota",
    "state of the art",
    "ablation",
    "conference",
];

const INFRA_TOKENS: &[&str] = &[
    "gpu",
    "gpus",
    "cuda",
    "nvlink",
    "nccl",
    "tpu",
    "accelerator",
    "inference",
    "serving",
    "deployment",
    "kubernetes",
    "k8s",
    "datacenter",
    "data center",
    "cluster",
    "bandwidth",
    "throughput",
    "latency",
    "mlops",
    "infrastructure",
    "infra",
    "vector database",
    "vector db",
];

const RESEARCH_SOURCE_TOKENS: &[&str] = &[
    "arxiv",
    "papers with code",
    "hugging face daily papers",
    "openreview",
    "deepmind blog",
];

const INFRA_SOURCE_TOKENS: &[&str] = &[
    "semianalysis",
    "nvidia",
    "amd",
    "intel",
    "coreweave",
    "lambda",
    "runpod",
    "together",
    "modal",
    "groq",
    "tenstorrent",
    "cerebras",
    "graphcore",
    "sambanova",
    "aws",
    "azure",
    "google cloud",
    "gcp",
];

/// Whole-word (or whole-phrase) containment, so "intel" does not match "intelligence".
fn contains_token(haystack: &str, token: &str) -> bool {
    haystack.match_indices(token).any(|(start, _)| {
        let end = start + token.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

/// Category suggested by keyword evidence in the text or the source name.
/// Research wins over infra; `None` when nothing matches.
pub fn route_category(item: &SourceItem) -> Option<Category> {
    let text = format!(
        "{} {}",
        item.title,
        item.summary.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    let source = item.source.to_lowercase();

    let hit = |tokens: &[&str], hay: &str| tokens.iter().any(|t| contains_token(hay, t));
    if hit(RESEARCH_TOKENS, &text) || hit(RESEARCH_SOURCE_TOKENS, &source) {
        return Some(Category::Research);
    }
    if hit(INFRA_TOKENS, &text) || hit(INFRA_SOURCE_TOKENS, &source) {
        return Some(Category::Infra);
    }
    None
}

/// Default screener when no LLM is configured: keeps everything and only
/// reclassifies items that carry clear keyword evidence.
pub struct HeuristicScreener;

#[async_trait::async_trait]
impl Screener for HeuristicScreener {
    async fn screen(&self, item: &SourceItem) -> Result<ScreenDecision> {
        Ok(ScreenDecision::keep(1.0, "no screener configured; default keep")
            .recategorized(route_category(item)))
    }

    fn provider_name(&self) -> &'static str {
        "heuristic"
    }
}
