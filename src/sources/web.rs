// src/sources/web.rs
//! Sources scraped from HTML pages rather than feeds.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use metrics::histogram;
use scraper::{Html, Selector};

use crate::normalize::clean_text;
use crate::sources::rss::filter_recent;
use crate::sources::types::{Category, SourceFetcher, SourceItem};

pub const GITHUB_TRENDING_URL: &str = "https://github.com/trending";
const GITHUB_BASE: &str = "https://github.com";
const SOURCE_NAME: &str = "GitHub Trending";
const SUMMARY_MAX_CHARS: usize = 500;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css:?}: {e:?}"))
}

/// Repositories listed on a GitHub trending page, in page order.
/// Rows without a repository link are skipped. The page carries no dates.
pub fn parse_github_trending(html: &str) -> Result<Vec<SourceItem>> {
    let rows = selector("article.Box-row")?;
    let name = selector("h2 a")?;
    let blurb = selector("p")?;

    let doc = Html::parse_document(html);
    let mut items = Vec::new();
    for row in doc.select(&rows) {
        let Some(link) = row.select(&name).next() else {
            continue;
        };
        let title = link
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        let Some(href) = link.value().attr("href").map(str::trim) else {
            continue;
        };
        if title.is_empty() || href.is_empty() {
            continue;
        }
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{GITHUB_BASE}{href}")
        };
        let summary = row
            .select(&blurb)
            .next()
            .map(|p| clean_text(&p.text().collect::<String>(), SUMMARY_MAX_CHARS))
            .filter(|s| !s.is_empty());

        let mut item = SourceItem::new(title, url, SOURCE_NAME);
        item.summary = summary;
        items.push(item);
    }
    Ok(items)
}

pub struct GithubTrendingSource {
    page_url: String,
    category: Category,
    client: reqwest::Client,
}

impl GithubTrendingSource {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tech-trends/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            page_url: GITHUB_TRENDING_URL.to_string(),
            category: Category::Product,
            client,
        }
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }
}

#[async_trait]
impl SourceFetcher for GithubTrendingSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, lookback_days: u32) -> Result<Vec<SourceItem>> {
        let t0 = Instant::now();
        let html = self
            .client
            .get(&self.page_url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.page_url))?
            .error_for_status()
            .with_context(|| format!("status for {}", self.page_url))?
            .text()
            .await
            .context("trending page body")?;

        let items = parse_github_trending(&html)?
            .into_iter()
            .map(|it| it.in_category(self.category))
            .collect();
        let items = filter_recent(items, lookback_days, Utc::now());

        histogram!("trends_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_without_links_are_skipped() {
        let html = r#"<html><body>
<article class="Box-row"><h2><span>no link</span></h2></article>
<article class="Box-row"><h2><a href="/acme/tool">acme / tool</a></h2></article>
</body></html>"#;
        let items = parse_github_trending(html).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://github.com/acme/tool");
        assert!(items[0].summary.is_none());
        assert!(items[0].published_at.is_none());
    }

    #[test]
    fn page_without_rows_is_empty() {
        assert!(parse_github_trending("<html><p>rate limited</p></html>")
            .unwrap()
            .is_empty());
    }
}
