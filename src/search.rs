// src/search.rs
//! Tavily search client: reference counting and feed discovery. Requires `TAVILY_API_KEY`.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::host_of;
use crate::references::{ReferenceCount, ReferenceCounter};
use crate::sources::discovery::{DiscoveredSource, SourceDiscovery};

const ENDPOINT: &str = "https://api.tavily.com/search";
const SAMPLE_URLS: usize = 5;

/// Query length and result-count limits for search calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_query_chars: usize,
    pub reference_max_results: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_query_chars: 380,
            reference_max_results: 8,
        }
    }
}

pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    search_depth: String,
    limits: SearchLimits,
}

impl TavilyClient {
    /// `None` when `TAVILY_API_KEY` is unset or empty.
    pub fn from_env(timeout: Duration, limits: SearchLimits) -> Result<Option<Self>> {
        let api_key = std::env::var("TAVILY_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Ok(None);
        }
        let mut client = Self::new(api_key, timeout)?.with_limits(limits);
        if let Ok(depth) = std::env::var("REFERENCE_SEARCH_DEPTH") {
            if !depth.trim().is_empty() {
                client.search_depth = depth.trim().to_string();
            }
        }
        Ok(Some(client))
    }

    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tech-trends/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building tavily http client")?;
        Ok(Self {
            http,
            api_key,
            endpoint: ENDPOINT.to_string(),
            search_depth: "basic".to_string(),
            limits: SearchLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let query = truncate_query(query, self.limits.max_query_chars);
        let req = SearchReq {
            query: &query,
            search_depth: &self.search_depth,
            max_results,
            include_answer: false,
        };
        let resp: SearchResp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("tavily request")?
            .error_for_status()
            .context("tavily status")?
            .json()
            .await
            .context("tavily body")?;
        Ok(resp.results)
    }
}

#[derive(Serialize)]
struct SearchReq<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct SearchResp {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(default)]
    title: String,
    url: String,
}

/// Cap a query at `max_chars` characters on a char boundary.
pub fn truncate_query(q: &str, max_chars: usize) -> String {
    q.trim().chars().take(max_chars).collect()
}

/// Distinct referencing hosts, excluding the item's own host.
pub(crate) fn coverage_from(hits: &[SearchHit], own_url: &str) -> ReferenceCount {
    let own = host_of(own_url);
    let mut hosts = BTreeSet::new();
    let mut sample_urls = Vec::new();
    for hit in hits {
        let Some(host) = host_of(&hit.url) else {
            continue;
        };
        if Some(&host) == own.as_ref() {
            continue;
        }
        if hosts.insert(host) && sample_urls.len() < SAMPLE_URLS {
            sample_urls.push(hit.url.clone());
        }
    }
    ReferenceCount {
        coverage_count: hosts.len() as u32,
        sample_urls,
    }
}

#[async_trait::async_trait]
impl ReferenceCounter for TavilyClient {
    async fn count_references(
        &self,
        url: &str,
        title: Option<&str>,
        _published_at: Option<DateTime<Utc>>,
    ) -> Result<ReferenceCount> {
        let query = match title {
            Some(t) if !t.trim().is_empty() => format!("\"{}\"", t.trim()),
            _ => url.to_string(),
        };
        let hits = self.search(&query, self.limits.reference_max_results).await?;
        Ok(coverage_from(&hits, url))
    }

    fn provider_name(&self) -> &'static str {
        "tavily"
    }
}

#[async_trait::async_trait]
impl SourceDiscovery for TavilyClient {
    async fn discover_sources(
        &self,
        domain_description: &str,
        max_results: usize,
    ) -> Result<Vec<DiscoveredSource>> {
        let hits = self
            .search(&format!("{domain_description} RSS feed"), max_results)
            .await?;
        Ok(hits
            .into_iter()
            .map(|h| DiscoveredSource {
                title: h.title,
                url: h.url,
            })
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "tavily"
    }
}
