// src/references.rs
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How widely an item is referenced elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCount {
    pub coverage_count: u32,
    #[serde(default)]
    pub sample_urls: Vec<String>,
}

/// Estimates how many other places reference a URL/title.
#[async_trait::async_trait]
pub trait ReferenceCounter: Send + Sync {
    async fn count_references(
        &self,
        url: &str,
        title: Option<&str>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<ReferenceCount>;

    /// Provider name for logs.
    fn provider_name(&self) -> &'static str;
}

pub type DynReferenceCounter = Arc<dyn ReferenceCounter>;
