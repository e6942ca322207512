// src/sources/types.rs
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output bucket of a trend. Categories are mutually exclusive per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Product,
    Research,
    Infra,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Product, Category::Research, Category::Infra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Product => "product",
            Category::Research => "research",
            Category::Infra => "infra",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" | "products" => Ok(Category::Product),
            "research" => Ok(Category::Research),
            "infra" | "infrastructure" => Ok(Category::Infra),
            other => anyhow::bail!("unknown category: {other}"),
        }
    }
}

/// One piece of content as discovered by a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceItem {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Logical origin name, e.g. "Hugging Face Blog".
    pub source: String,
    pub summary: Option<String>,
    pub category: Option<Category>,
}

impl SourceItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published_at: None,
            source: source.into(),
            summary: None,
            category: None,
        }
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn in_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// A source of candidate items for a lookback window (feed, curated list, scraper).
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Stable name; doubles as the Fair Selector's per-source key.
    fn name(&self) -> &str;

    async fn fetch(&self, lookback_days: u32) -> Result<Vec<SourceItem>>;
}

pub type DynSource = Arc<dyn SourceFetcher>;

/// A logical group of sources feeding one category (a curated list or a domain expert).
#[derive(Clone)]
pub struct SourceGroup {
    pub name: String,
    pub category: Category,
    pub sources: Vec<DynSource>,
}

impl SourceGroup {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: DynSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Source names in declaration order.
    pub fn source_order(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }
}

impl fmt::Debug for SourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceGroup")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("sources", &self.source_order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_aliases() {
        assert_eq!("Products".parse::<Category>().unwrap(), Category::Product);
        assert_eq!(" infrastructure ".parse::<Category>().unwrap(), Category::Infra);
        assert!("sports".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let s = serde_json::to_string(&Category::Research).unwrap();
        assert_eq!(s, "\"research\"");
    }
}
