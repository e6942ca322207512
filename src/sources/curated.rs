// src/sources/curated.rs
//! Curated feed list: built-in defaults with an optional TOML/JSON override.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use super::rss::RssFeedSource;
use super::types::{Category, SourceGroup};

const ENV_PATH: &str = "TRENDS_SOURCES_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    pub category: Category,
    pub name: String,
    pub url: String,
}

impl FeedSpec {
    pub(crate) fn new(category: Category, name: &str, url: &str) -> Self {
        Self {
            category,
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

pub fn builtin_feeds() -> Vec<FeedSpec> {
    use Category::*;
    vec![
        FeedSpec::new(Product, "OpenAI News", "https://openai.com/news/rss.xml"),
        FeedSpec::new(Product, "Google DeepMind Blog", "https://deepmind.com/blog/rss.xml"),
        FeedSpec::new(Product, "Hugging Face Blog", "https://huggingface.co/blog/feed.xml"),
        FeedSpec::new(Product, "AWS ML Blog", "https://aws.amazon.com/blogs/machine-learning/feed/"),
        FeedSpec::new(Product, "TechCrunch", "https://techcrunch.com/feed/"),
        FeedSpec::new(Product, "WIRED AI", "https://www.wired.com/feed/tag/ai/latest/rss"),
        FeedSpec::new(Product, "GitHub Blog", "https://github.com/blog.atom"),
        FeedSpec::new(Product, "Deno Blog", "https://deno.com/blog/rss.xml"),
        FeedSpec::new(Product, "GitHub Release Radar", "https://github.blog/tag/release-radar/feed/"),
        FeedSpec::new(Product, "Simon Willison Blog", "https://simonwillison.net/atom/everything/"),
        FeedSpec::new(Research, "Papers with Code", "https://paperswithcode.com/rss"),
        FeedSpec::new(Research, "arXiv cs.AI", "https://export.arxiv.org/rss/cs.AI"),
        FeedSpec::new(Research, "arXiv cs.LG", "https://export.arxiv.org/rss/cs.LG"),
        FeedSpec::new(Infra, "SemiAnalysis", "https://semianalysis.com/feed"),
        FeedSpec::new(Infra, "Latent Space", "https://www.latent.space/feed"),
        FeedSpec::new(Infra, "NVIDIA Developer Blog", "https://developer.nvidia.com/blog/rss/"),
    ]
}

/// Load a feed list from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
}

/// Load the feed list using env var + fallbacks:
/// 1) $TRENDS_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in list
pub fn load_feeds_default() -> Result<Vec<FeedSpec>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_feeds_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_feeds_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_feeds_from(&json_p);
    }
    Ok(builtin_feeds())
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<Vec<FeedSpec>> {
    let try_toml = hint_ext == "toml" || s.contains("[[feeds]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed list format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSpec>> {
    #[derive(Deserialize)]
    struct TomlFeeds {
        feeds: Vec<FeedSpec>,
    }
    let v: TomlFeeds = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<FeedSpec>> {
    let v: Vec<FeedSpec> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim names/URLs, drop blanks, keep the first entry per URL.
fn clean_list(items: Vec<FeedSpec>) -> Vec<FeedSpec> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|f| FeedSpec {
            category: f.category,
            name: f.name.trim().to_string(),
            url: f.url.trim().to_string(),
        })
        .filter(|f| !f.name.is_empty() && !f.url.is_empty())
        .filter(|f| seen.insert(f.url.clone()))
        .collect()
}

/// One RSS-backed group per category, in `Category::ALL` order; empty categories are skipped.
pub fn curated_groups(feeds: &[FeedSpec], timeout: Duration) -> Vec<SourceGroup> {
    Category::ALL
        .iter()
        .filter_map(|&cat| {
            let mut group = SourceGroup::new(format!("curated-{cat}"), cat);
            for f in feeds.iter().filter(|f| f.category == cat) {
                let src = RssFeedSource::new(f.name.clone(), f.url.clone(), timeout).with_category(cat);
                group = group.with_source(Arc::new(src));
            }
            (!group.sources.is_empty()).then_some(group)
        })
        .collect()
}
