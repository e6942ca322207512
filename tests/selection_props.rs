// tests/selection_props.rs
use std::collections::{HashMap, HashSet};

use tech_trends::dedup::Deduplicator;
use tech_trends::normalize::{title_key, url_key};
use tech_trends::select::{select, SelectLimits};
use tech_trends::sources::SourceItem;

/// Deterministic feed set: `sizes[i]` items for source `s{i}`. Every third item after
/// the first re-uses a title from source 0 so cross-source duplicates show up.
fn feeds(sizes: &[usize]) -> (HashMap<String, Vec<SourceItem>>, Vec<String>) {
    let mut map = HashMap::new();
    let mut order = Vec::new();
    for (s, &n) in sizes.iter().enumerate() {
        let name = format!("s{s}");
        let items = (0..n)
            .map(|i| {
                let title = if s > 0 && i % 3 == 1 {
                    format!("s0 story {i}")
                } else {
                    format!("{name} story {i}")
                };
                SourceItem::new(title, format!("https://{name}.test/{i}"), name.as_str())
            })
            .collect();
        map.insert(name.clone(), items);
        order.push(name);
    }
    (map, order)
}

#[test]
fn dedupe_is_idempotent() {
    let (map, order) = feeds(&[6, 5, 4]);
    let all: Vec<SourceItem> = order.iter().flat_map(|n| map[n].clone()).collect();

    let mut d = Deduplicator::new();
    let first = d.dedupe(all.clone());
    assert!(!first.is_empty());
    assert!(d.dedupe(all).is_empty());
    assert!(d.dedupe(first).is_empty());
}

#[test]
fn selection_respects_bounds_across_shapes() {
    let shapes: &[&[usize]] = &[&[0], &[1], &[10], &[10, 1, 1], &[3, 3, 3, 3, 3, 3], &[0, 7, 0, 2]];
    let limit_sets = [(1, 1, 1), (5, 3, 2), (24, 5, 4), (3, 10, 10), (8, 0, 3)];

    for sizes in shapes {
        for &(max_items, min_unique, per_source) in &limit_sets {
            let (map, order) = feeds(sizes);
            let mut d = Deduplicator::new();
            let limits = SelectLimits {
                max_items,
                min_unique_domains: min_unique,
                max_items_per_source: per_source,
            };
            let out = select(map, &order, limits, &mut d);
            let ctx = format!("sizes={sizes:?} limits={limits:?}");

            assert!(out.len() <= max_items, "{ctx}");

            let mut per: HashMap<&str, usize> = HashMap::new();
            for it in &out {
                *per.entry(it.source.as_str()).or_insert(0) += 1;
            }
            assert!(per.values().all(|&n| n <= per_source), "{ctx}");

            let titles: HashSet<_> = out.iter().map(|i| title_key(&i.title)).collect();
            let urls: HashSet<_> = out.iter().map(|i| url_key(&i.url)).collect();
            assert_eq!(titles.len(), out.len(), "{ctx}");
            assert_eq!(urls.len(), out.len(), "{ctx}");

            let nonempty = sizes.iter().filter(|&&n| n > 0).count();
            let target = min_unique.min(nonempty).min(max_items);
            assert!(per.len() >= target, "{ctx}: {} sources < {target}", per.len());
        }
    }
}

#[test]
fn selection_stops_when_sources_run_dry() {
    let mut map = HashMap::new();
    map.insert(
        "a".to_string(),
        vec![
            SourceItem::new("Shared story", "https://a.test/1", "a"),
            SourceItem::new("Only on a", "https://a.test/2", "a"),
        ],
    );
    map.insert(
        "b".to_string(),
        vec![SourceItem::new("shared story!", "https://b.test/1", "b")],
    );
    let order = vec!["a".to_string(), "b".to_string()];
    let mut d = Deduplicator::new();
    let out = select(
        map,
        &order,
        SelectLimits {
            max_items: 100,
            min_unique_domains: 5,
            max_items_per_source: 100,
        },
        &mut d,
    );
    // b's only item duplicates a's title.
    assert_eq!(out.len(), 2);
    assert_eq!(d.corroboration("Shared story"), 2);
}
