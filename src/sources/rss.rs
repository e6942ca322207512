// src/sources/rss.rs
//! RSS 2.0 / RSS 1.0 (RDF) / Atom feed source over HTTP.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::normalize::clean_text;
use crate::sources::types::{Category, SourceFetcher, SourceItem};

const TITLE_MAX_CHARS: usize = 300;
const SUMMARY_MAX_CHARS: usize = 1500;

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
}

// --- RSS 1.0 (items are siblings of the channel) ---

#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let parsed = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?;
    DateTime::from_timestamp(parsed.unix_timestamp(), parsed.nanosecond())
}

/// HTML named entities that feeds embed but XML does not define.
const HTML_ONLY_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&ndash;", "-"),
    ("&mdash;", "-"),
    ("&ldquo;", "\""),
    ("&rdquo;", "\""),
    ("&lsquo;", "'"),
    ("&rsquo;", "'"),
    ("&hellip;", "..."),
];

fn replace_html_only_entities(body: &str) -> String {
    HTML_ONLY_ENTITIES
        .iter()
        .fold(body.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

fn make_item(
    source: &str,
    feed_url: &str,
    title: Option<&str>,
    link: Option<&str>,
    published_at: Option<DateTime<Utc>>,
    summary: Option<&str>,
) -> SourceItem {
    let title = title
        .map(|t| clean_text(t, TITLE_MAX_CHARS))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let url = link
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(feed_url)
        .to_string();
    let summary = summary
        .map(|s| clean_text(s, SUMMARY_MAX_CHARS))
        .filter(|s| !s.is_empty());
    SourceItem {
        title,
        url,
        published_at,
        source: source.to_string(),
        summary,
        category: None,
    }
}

/// Parse a feed body into items (no date filtering).
pub fn parse_feed(body: &str, source: &str, feed_url: &str) -> Result<Vec<SourceItem>> {
    let xml = replace_html_only_entities(body);

    // RSS 1.0 also has a <channel>, but its items sit beside it.
    if xml.contains("<rdf:RDF") {
        let rdf: Rdf = from_str(&xml).context("parsing rdf feed")?;
        return Ok(rss_items(rdf.item, source, feed_url));
    }
    if let Ok(rss) = from_str::<Rss>(&xml) {
        return Ok(rss_items(rss.channel.item, source, feed_url));
    }
    if xml.contains("<feed") {
        let atom: AtomFeed = from_str(&xml).context("parsing atom feed")?;
        return Ok(atom
            .entry
            .into_iter()
            .map(|e| {
                let link = e
                    .link
                    .iter()
                    .find(|l| l.rel.as_deref().unwrap_or("alternate") == "alternate")
                    .or_else(|| e.link.first())
                    .map(|l| l.href.as_str());
                let published = e
                    .published
                    .as_deref()
                    .or(e.updated.as_deref())
                    .and_then(parse_timestamp);
                let summary = e.summary.as_ref().or(e.content.as_ref());
                make_item(
                    source,
                    feed_url,
                    e.title.as_ref().map(|t| t.value.as_str()),
                    link,
                    published,
                    summary.map(|s| s.value.as_str()),
                )
            })
            .collect());
    }
    anyhow::bail!("not an RSS or Atom document")
}

fn rss_items(items: Vec<Item>, source: &str, feed_url: &str) -> Vec<SourceItem> {
    items
        .into_iter()
        .map(|it| {
            let published = it
                .pub_date
                .as_deref()
                .or(it.dc_date.as_deref())
                .and_then(parse_timestamp);
            make_item(
                source,
                feed_url,
                it.title.as_deref(),
                it.link.as_deref(),
                published,
                it.description.as_deref(),
            )
        })
        .collect()
}

/// Keep items published within `lookback_days` of `now`; undated items are kept.
pub fn filter_recent(
    items: Vec<SourceItem>,
    lookback_days: u32,
    now: DateTime<Utc>,
) -> Vec<SourceItem> {
    let cutoff = now - chrono::Duration::days(i64::from(lookback_days));
    items
        .into_iter()
        .filter(|it| it.published_at.map_or(true, |at| at >= cutoff))
        .collect()
}

pub struct RssFeedSource {
    name: String,
    feed_url: String,
    category: Option<Category>,
    client: reqwest::Client,
}

impl RssFeedSource {
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tech-trends/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
            category: None,
            client,
        }
    }

    /// Tag every item from this feed with `category`.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }
}

#[async_trait]
impl SourceFetcher for RssFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, lookback_days: u32) -> Result<Vec<SourceItem>> {
        let t0 = Instant::now();
        let body = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.feed_url))?
            .error_for_status()
            .with_context(|| format!("status for {}", self.feed_url))?
            .text()
            .await
            .context("feed body")?;

        let mut items = parse_feed(&body, &self.name, &self.feed_url)?;
        if let Some(cat) = self.category {
            for it in &mut items {
                it.category.get_or_insert(cat);
            }
        }
        let items = filter_recent(items, lookback_days, Utc::now());

        histogram!("trends_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Blog</title>
<item><title>Model X Launches&nbsp;Today</title><link>https://blog.test/x</link>
<pubDate>Sat, 01 Mar 2025 06:00:00 GMT</pubDate><description><![CDATA[<p>Big <b>news</b></p>]]></description></item>
<item><title>No date</title><link>https://blog.test/y</link></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>Atom blog</title>
<entry><title type="html">Atom entry</title>
<link rel="alternate" href="https://atom.test/a"/>
<updated>2025-02-27T10:00:00Z</updated><summary>Short</summary></entry>
</feed>"#;

    #[test]
    fn parses_rss_items() {
        let items = parse_feed(RSS, "Blog", "https://blog.test/feed").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Model X Launches Today");
        assert_eq!(items[0].summary.as_deref(), Some("Big news"));
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap())
        );
        assert!(items[1].published_at.is_none());
        assert_eq!(items[1].source, "Blog");
    }

    #[test]
    fn parses_atom_entries() {
        let items = parse_feed(ATOM, "Atom", "https://atom.test/feed").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://atom.test/a");
        assert_eq!(items[0].title, "Atom entry");
        assert!(items[0].published_at.is_some());
    }

    #[test]
    fn recent_filter_keeps_undated() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let items = parse_feed(RSS, "Blog", "https://blog.test/feed").unwrap();
        let kept = filter_recent(items.clone(), 3, now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "No date");
        assert_eq!(filter_recent(items, 30, now).len(), 2);
    }

    #[test]
    fn invalid_xml_is_an_error() {
        assert!(parse_feed("<html><body>nope", "X", "https://x.test").is_err());
    }
}
