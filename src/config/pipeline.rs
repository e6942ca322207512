// src/config/pipeline.rs
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one pipeline run. Every field has an env override; unparseable
/// values fall back to the default with a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub default_lookback_days: u32,
    pub lookback_step_days: u32,
    pub max_lookback_days: u32,
    pub max_trends_per_category: usize,
    pub collection_limit_per_category: usize,
    pub max_items_per_expert: usize,
    pub max_items_per_source: usize,
    pub min_unique_domains: usize,
    pub max_collection_passes: u32,
    pub max_reference_lookups: usize,
    pub half_life_days: f64,
    pub max_workers: usize,
    pub reference_workers: usize,
    pub min_screen_confidence: f32,
    pub compute_trending_score: bool,
    pub overwrite_execution: bool,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    pub discovery_enabled: bool,
    pub discovery_max_results: usize,
    pub search_max_query_chars: usize,
    pub reference_search_max_results: usize,
    pub github_trending: bool,
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: 3,
            lookback_step_days: 2,
            max_lookback_days: 14,
            max_trends_per_category: 12,
            collection_limit_per_category: 18,
            max_items_per_expert: 24,
            max_items_per_source: 4,
            min_unique_domains: 5,
            max_collection_passes: 3,
            max_reference_lookups: 30,
            half_life_days: 7.0,
            max_workers: 12,
            reference_workers: 4,
            min_screen_confidence: 0.6,
            compute_trending_score: true,
            overwrite_execution: true,
            request_timeout: Duration::from_secs(12),
            discovery_enabled: false,
            discovery_max_results: 8,
            search_max_query_chars: 380,
            reference_search_max_results: 8,
            github_trending: true,
            dry_run: false,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match get(name) {
        None => default,
        Some(raw) if raw.trim().is_empty() => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, default = %default, "invalid value; using default");
                default
            }
        },
    }
}

fn flag_or(get: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    let Some(raw) = get(name) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => default,
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => {
            tracing::warn!(var = name, value = %raw, default, "invalid flag; using default");
            default
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Build from any key lookup (env, map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let cfg = Self {
            default_lookback_days: parse_or(&get, "DEFAULT_LOOKBACK_DAYS", d.default_lookback_days),
            lookback_step_days: parse_or(&get, "LOOKBACK_STEP_DAYS", d.lookback_step_days),
            max_lookback_days: parse_or(&get, "MAX_LOOKBACK_DAYS", d.max_lookback_days),
            max_trends_per_category: parse_or(&get, "MAX_TRENDS_PER_CATEGORY", d.max_trends_per_category),
            collection_limit_per_category: parse_or(
                &get,
                "COLLECTION_LIMIT_PER_CATEGORY",
                d.collection_limit_per_category,
            ),
            max_items_per_expert: parse_or(&get, "MAX_ITEMS_PER_EXPERT", d.max_items_per_expert),
            max_items_per_source: parse_or(&get, "MAX_ITEMS_PER_SOURCE", d.max_items_per_source),
            min_unique_domains: parse_or(&get, "MIN_UNIQUE_DOMAINS", d.min_unique_domains),
            max_collection_passes: parse_or(&get, "MAX_COLLECTION_PASSES", d.max_collection_passes),
            max_reference_lookups: parse_or(&get, "MAX_REFERENCE_LOOKUPS", d.max_reference_lookups),
            half_life_days: parse_or(&get, "TREND_SCORE_HALF_LIFE_DAYS", d.half_life_days),
            max_workers: parse_or(&get, "TRENDS_MAX_WORKERS", d.max_workers),
            reference_workers: parse_or(&get, "REFERENCE_MAX_WORKERS", d.reference_workers),
            min_screen_confidence: parse_or(&get, "MIN_SCREEN_CONFIDENCE", d.min_screen_confidence),
            compute_trending_score: flag_or(&get, "COMPUTE_TRENDING_SCORE", d.compute_trending_score),
            overwrite_execution: flag_or(&get, "OVERWRITE_EXECUTION", d.overwrite_execution),
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "TRENDS_REQUEST_TIMEOUT_SECS",
                d.request_timeout.as_secs(),
            )),
            discovery_enabled: flag_or(&get, "TRENDS_DISCOVERY", d.discovery_enabled),
            discovery_max_results: parse_or(&get, "DISCOVERY_MAX_RESULTS", d.discovery_max_results),
            search_max_query_chars: parse_or(&get, "SEARCH_MAX_QUERY_CHARS", d.search_max_query_chars),
            reference_search_max_results: parse_or(
                &get,
                "REFERENCE_SEARCH_MAX_RESULTS",
                d.reference_search_max_results,
            ),
            github_trending: flag_or(&get, "TRENDS_GITHUB_TRENDING", d.github_trending),
            dry_run: flag_or(&get, "TRENDS_DRY_RUN", d.dry_run),
        };
        cfg.sanitized()
    }

    /// Override the starting lookback (CLI argument); widens the max if needed.
    pub fn with_lookback(mut self, days: u32) -> Self {
        self.default_lookback_days = days;
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        let d = Self::default();
        self.default_lookback_days = self.default_lookback_days.max(1);
        self.lookback_step_days = self.lookback_step_days.max(1);
        if self.max_lookback_days < self.default_lookback_days {
            self.max_lookback_days = self.default_lookback_days;
        }
        self.max_collection_passes = self.max_collection_passes.max(1);
        self.max_items_per_source = self.max_items_per_source.max(1);
        self.max_workers = self.max_workers.max(1);
        self.reference_workers = self.reference_workers.max(1);
        self.search_max_query_chars = self.search_max_query_chars.max(1);
        self.reference_search_max_results = self.reference_search_max_results.max(1);
        if !(self.half_life_days.is_finite() && self.half_life_days > 0.0) {
            self.half_life_days = d.half_life_days;
        }
        if !self.min_screen_confidence.is_finite() {
            self.min_screen_confidence = d.min_screen_confidence;
        }
        self.min_screen_confidence = self.min_screen_confidence.clamp(0.0, 1.0);
        if self.request_timeout.is_zero() {
            self.request_timeout = d.request_timeout;
        }
        self
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
