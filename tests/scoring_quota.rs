// tests/scoring_quota.rs
use chrono::{Duration, TimeZone, Utc};

use tech_trends::quota::enforce;
use tech_trends::scoring::trending_score;
use tech_trends::sources::{Category, SourceItem};
use tech_trends::trend::TrendItem;

#[test]
fn score_grows_with_references_and_decays_with_age() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    for days in [0i64, 1, 3, 10] {
        let at = Some(now - Duration::days(days));
        let mut prev = -1.0;
        for rc in 0..20u32 {
            let s = trending_score(rc, at, now, 7.0);
            assert!(s >= 0.0);
            assert!(s > prev, "rc={rc} days={days}");
            prev = s;
        }
    }
    for rc in [1u32, 5, 50] {
        let mut prev = f64::INFINITY;
        for days in 0..30i64 {
            let s = trending_score(rc, Some(now - Duration::days(days)), now, 7.0);
            assert!(s < prev, "rc={rc} days={days}");
            prev = s;
        }
    }
}

#[test]
fn quota_keeps_top_two_of_five() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let items = [9.0, 7.0, 5.0, 3.0, 1.0]
        .into_iter()
        .enumerate()
        .map(|(i, score)| {
            let src = SourceItem::new(format!("story {i}"), format!("https://s.test/{i}"), "S")
                .in_category(Category::Infra);
            TrendItem::from_source(&src, 1, score, Vec::new(), now)
        })
        .collect();
    let out = enforce(items, 2, true);
    let scores: Vec<f64> = out.iter().map(|t| t.trending_score).collect();
    assert_eq!(scores, vec![9.0, 7.0]);
    assert!(out.iter().all(|t| t.category == Category::Infra));
    assert_eq!(out[0].source_references, vec!["S"]);
}
