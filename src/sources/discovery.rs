// src/sources/discovery.rs
//! Domain experts and search-driven feed discovery.
//!
//! Each expert describes a domain in plain words; a [`SourceDiscovery`] provider turns
//! that description into candidate URLs, and feed-looking ones become RSS sources in a
//! per-expert group.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::rss::RssFeedSource;
use super::types::{Category, SourceGroup};
use crate::normalize::host_of;
use crate::pool::fan_out;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainExpert {
    pub name: String,
    pub category: Category,
    pub description: String,
    pub domain_description: String,
}

impl DomainExpert {
    fn new(name: &str, category: Category, description: &str, domain_description: &str) -> Self {
        Self {
            name: name.to_string(),
            category,
            description: description.to_string(),
            domain_description: domain_description.to_string(),
        }
    }
}

pub fn builtin_experts() -> Vec<DomainExpert> {
    vec![
        DomainExpert::new(
            "Product Scout",
            Category::Product,
            "Tracks product launches, changelogs, and platform upgrades.",
            "AI product launches, developer tools, platform releases, changelogs, \
             official product blogs with RSS feeds, tech newsletters, API announcements",
        ),
        DomainExpert::new(
            "Research Analyst",
            Category::Research,
            "Evaluates papers, benchmarks, and model capability shifts.",
            "ML AI research papers, arXiv preprints, benchmarks, datasets, model releases, \
             academic lab blogs with RSS feeds, research newsletters, conference proceedings",
        ),
        DomainExpert::new(
            "Infra Strategist",
            Category::Infra,
            "Assesses infra, compute, and deployment stack shifts.",
            "AI infrastructure, GPUs, accelerators, inference/serving stacks, model hosting, \
             cloud compute, vector databases, MLOps, infra vendor blogs with RSS feeds",
        ),
    ]
}

/// A candidate source returned by a discovery provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredSource {
    pub title: String,
    pub url: String,
}

/// Finds candidate sources for a domain description.
#[async_trait::async_trait]
pub trait SourceDiscovery: Send + Sync {
    async fn discover_sources(
        &self,
        domain_description: &str,
        max_results: usize,
    ) -> Result<Vec<DiscoveredSource>>;

    fn provider_name(&self) -> &'static str;
}

pub type DynDiscovery = Arc<dyn SourceDiscovery>;

const FEED_HINTS: &[&str] = &["rss", "feed", "atom", ".xml"];

/// Heuristic: the URL path or query mentions a feed format.
pub fn looks_like_feed(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url.trim()) else {
        return false;
    };
    let tail = format!(
        "{}{}",
        parsed.path().to_ascii_lowercase(),
        parsed.query().unwrap_or_default().to_ascii_lowercase()
    );
    FEED_HINTS.iter().any(|h| tail.contains(h))
}

/// Group of RSS sources for one expert: feed-looking URLs only, one per host,
/// named after the host.
pub fn expert_group(
    expert: &DomainExpert,
    found: &[DiscoveredSource],
    timeout: Duration,
) -> SourceGroup {
    let mut hosts = HashSet::new();
    let mut group = SourceGroup::new(expert.name.clone(), expert.category);
    for d in found.iter().filter(|d| looks_like_feed(&d.url)) {
        let Some(host) = host_of(&d.url) else {
            continue;
        };
        if !hosts.insert(host.clone()) {
            continue;
        }
        let src = RssFeedSource::new(host, d.url.trim(), timeout).with_category(expert.category);
        group = group.with_source(Arc::new(src));
    }
    group
}

/// Run discovery for every expert concurrently. Provider failures are returned as
/// error strings; experts that found no feeds yield no group.
pub async fn discover_groups(
    discovery: &DynDiscovery,
    experts: &[DomainExpert],
    max_results: usize,
    timeout: Duration,
) -> (Vec<SourceGroup>, Vec<String>) {
    let results = fan_out(experts.to_vec(), experts.len(), |expert| {
        let discovery = discovery.clone();
        async move {
            let found = discovery
                .discover_sources(&expert.domain_description, max_results)
                .await;
            (expert, found)
        }
    })
    .await;

    let mut groups = Vec::new();
    let mut errors = Vec::new();
    for (expert, found) in results {
        match found {
            Ok(found) => {
                let group = expert_group(&expert, &found, timeout);
                tracing::info!(
                    target: "collect",
                    expert = %expert.name,
                    candidates = found.len(),
                    feeds = group.sources.len(),
                    "discovery finished"
                );
                if !group.sources.is_empty() {
                    groups.push(group);
                }
            }
            Err(e) => {
                tracing::warn!(target: "collect", expert = %expert.name, error = %e, "discovery failed");
                errors.push(format!("discovery {}: {e:#}", expert.name));
            }
        }
    }
    (groups, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(url: &str) -> DiscoveredSource {
        DiscoveredSource {
            title: "t".into(),
            url: url.into(),
        }
    }

    #[test]
    fn one_expert_per_category() {
        let experts = builtin_experts();
        let cats: HashSet<_> = experts.iter().map(|e| e.category).collect();
        assert_eq!(cats.len(), Category::ALL.len());
    }

    #[test]
    fn feed_detection_uses_path_and_query() {
        assert!(looks_like_feed("https://blog.test/feed/"));
        assert!(looks_like_feed("https://blog.test/index.xml"));
        assert!(looks_like_feed("https://blog.test/?format=rss"));
        assert!(!looks_like_feed("https://feedly.test/about"));
        assert!(!looks_like_feed("not a url"));
    }

    #[test]
    fn expert_group_keeps_one_feed_per_host() {
        let expert = &builtin_experts()[2];
        let group = expert_group(
            expert,
            &[
                found("https://www.infra.test/rss"),
                found("https://infra.test/atom.xml"),
                found("https://infra.test/pricing"),
                found("https://gpu.test/feed"),
            ],
            Duration::from_secs(1),
        );
        assert_eq!(group.category, Category::Infra);
        assert_eq!(group.source_order(), vec!["infra.test", "gpu.test"]);
    }

    struct Flaky;

    #[async_trait::async_trait]
    impl SourceDiscovery for Flaky {
        async fn discover_sources(&self, domain: &str, _max: usize) -> Result<Vec<DiscoveredSource>> {
            if domain.contains("research") {
                anyhow::bail!("quota exceeded");
            }
            Ok(vec![found("https://any.test/feed")])
        }

        fn provider_name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn discovery_failures_are_collected() {
        let discovery: DynDiscovery = Arc::new(Flaky);
        let (groups, errors) =
            discover_groups(&discovery, &builtin_experts(), 5, Duration::from_secs(1)).await;
        assert_eq!(groups.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("discovery Research Analyst"));
    }
}
