// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod quota;
pub mod references;
pub mod scoring;
pub mod screen;
pub mod search;
pub mod select;
pub mod sources;
pub mod store;
pub mod trend;

// ---- Re-exports for stable public API ----
pub use crate::config::PipelineConfig;
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::sources::{Category, SourceItem};
pub use crate::trend::TrendItem;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::screen::{DynScreener, OpenAiScreener};
use crate::search::{SearchLimits, TavilyClient};
use crate::sources::{
    builtin_experts, curated_groups, discover_groups, load_feeds_default, DynDiscovery,
    GithubTrendingSource, SourceGroup,
};
use crate::store::{MemoryStore, SupabaseStore, TrendStore};

/// Wire collaborators from the environment:
/// curated feeds plus GitHub Trending (+ discovery groups when `TRENDS_DISCOVERY=1` and Tavily is configured),
/// the OpenAI screener when `OPENAI_API_KEY` is set, Tavily reference counts when
/// `TAVILY_API_KEY` is set, and Supabase (or memory when `TRENDS_DRY_RUN=1`).
pub async fn pipeline_from_env(config: PipelineConfig) -> Result<Pipeline> {
    let timeout = config.request_timeout;

    let feeds = load_feeds_default()?;
    let mut groups = curated_groups(&feeds, timeout);
    if config.github_trending {
        add_to_category(&mut groups, Category::Product, Arc::new(GithubTrendingSource::new(timeout)));
    }
    info!(feeds = feeds.len(), groups = groups.len(), "curated sources loaded");

    let limits = SearchLimits {
        max_query_chars: config.search_max_query_chars,
        reference_max_results: config.reference_search_max_results,
    };
    let tavily = TavilyClient::from_env(timeout, limits)?.map(Arc::new);

    if config.discovery_enabled {
        match &tavily {
            Some(client) => {
                let discovery: DynDiscovery = client.clone();
                let (found, errors) = discover_groups(
                    &discovery,
                    &builtin_experts(),
                    config.discovery_max_results,
                    timeout,
                )
                .await;
                for e in &errors {
                    warn!(error = %e, "discovery error");
                }
                groups.extend(found);
            }
            None => warn!("TRENDS_DISCOVERY is set but TAVILY_API_KEY is missing; skipping discovery"),
        }
    }

    let store: Arc<dyn TrendStore> = if config.dry_run {
        info!("dry run: results stay in memory");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SupabaseStore::from_env(timeout))
    };

    let mut pipeline = Pipeline::new(config, groups, store);
    if let Some(screener) = OpenAiScreener::from_env(timeout)? {
        let screener: DynScreener = Arc::new(screener);
        pipeline = pipeline.with_screener(screener);
    }
    if let Some(client) = tavily {
        pipeline = pipeline.with_reference_counter(client);
    }
    Ok(pipeline)
}

/// Append `source` to the first group of `category`, or start one.
fn add_to_category(groups: &mut Vec<SourceGroup>, category: Category, source: sources::DynSource) {
    match groups.iter_mut().find(|g| g.category == category) {
        Some(group) => group.sources.push(source),
        None => groups.push(SourceGroup::new(format!("curated-{category}"), category).with_source(source)),
    }
}
