// tests/feeds.rs
use chrono::{TimeZone, Utc};

use tech_trends::sources::rss::{filter_recent, parse_feed};
use tech_trends::sources::web::parse_github_trending;

#[test]
fn rdf_feed_items_are_parsed() {
    let xml = std::fs::read_to_string("tests/fixtures/arxiv_rdf.xml").expect("fixture");
    let items = parse_feed(&xml, "arXiv cs.AI", "https://export.arxiv.org/rss/cs.AI").unwrap();

    assert_eq!(items.len(), 2);
    assert!(items[0].title.starts_with("Sparse Mixtures for Long-Context Reasoning"));
    assert_eq!(items[0].url, "http://arxiv.org/abs/2503.00001");
    assert_eq!(
        items[1].summary.as_deref(),
        Some("A new benchmark with 1,200 tasks.")
    );
    assert!(items.iter().all(|i| i.source == "arXiv cs.AI"));
}

#[test]
fn atom_feed_prefers_alternate_links_and_published_dates() {
    let xml = std::fs::read_to_string("tests/fixtures/github_atom.xml").expect("fixture");
    let items = parse_feed(&xml, "GitHub Blog", "https://github.com/blog.atom").unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].url, "https://github.blog/news/copilot-agent-mode-ga/");
    assert_eq!(
        items[0].published_at,
        Some(Utc.with_ymd_and_hms(2025, 2, 28, 17, 0, 0).unwrap())
    );
    assert!(items[0]
        .summary
        .as_deref()
        .is_some_and(|s| s.starts_with("Agent mode")));
    assert_eq!(items[1].url, "https://github.blog/changelog/roundup/");

    let now = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
    let recent = filter_recent(items, 3, now);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "Copilot agent mode is generally available");
}

#[test]
fn github_trending_rows_become_undated_items() {
    let html = std::fs::read_to_string("tests/fixtures/github_trending.html").expect("fixture");
    let items = parse_github_trending(&html).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "vllm-project / vllm");
    assert_eq!(items[0].url, "https://github.com/vllm-project/vllm");
    assert_eq!(items[0].source, "GitHub Trending");
    assert_eq!(
        items[0].summary.as_deref(),
        Some("A high-throughput and memory-efficient inference & serving engine for LLMs")
    );
    assert_eq!(items[1].title, "openai / agents-sdk");
    assert!(items[1].summary.is_none());

    // No dates on the page, so the lookback filter keeps everything.
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap();
    assert_eq!(filter_recent(items, 1, now).len(), 2);
}
