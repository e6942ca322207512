// src/sources/mod.rs
pub mod curated;
pub mod discovery;
pub mod rss;
pub mod types;
pub mod web;

pub use curated::{builtin_feeds, curated_groups, load_feeds_default, FeedSpec};
pub use discovery::{
    builtin_experts, discover_groups, DiscoveredSource, DomainExpert, DynDiscovery,
    SourceDiscovery,
};
pub use rss::RssFeedSource;
pub use web::GithubTrendingSource;
pub use types::{Category, DynSource, SourceFetcher, SourceGroup, SourceItem};
