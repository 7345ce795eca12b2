//! Matcher behavior at the public API level: expansion hits, clean misses,
//! and filter ordering guarantees.

use news_radar::matcher::TopicMatcher;

#[test]
fn expansion_table_hit_scores_positive() {
    let m = TopicMatcher::default();
    let res = m.match_topic("artificial intelligence breakthrough", "ai");
    assert!(res.matched);
    assert!(res.score > 0.0);
    assert!(res.score <= 1.0);
}

#[test]
fn unrelated_topic_is_a_zero_score_miss() {
    let m = TopicMatcher::default();
    let res = m.match_topic("today's weather forecast", "crypto");
    assert!(!res.matched);
    assert_eq!(res.score, 0.0);
}

#[test]
fn filter_returns_sorted_subset() {
    let m = TopicMatcher::default();
    let input = vec![
        "the senate passed new legislation".to_string(),
        "a quiet day in the garden".to_string(),
        "politics roundup: congress and parliament".to_string(),
    ];
    let out = m.filter_by_topic(input.clone(), "politics", 0.0, |s| s.clone());

    // Subset of the input, misses dropped.
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|s| input.contains(s)));
    assert!(!out.iter().any(|s| s.contains("garden")));

    // Descending by score.
    let scores: Vec<f64> = out.iter().map(|s| m.match_topic(s, "politics").score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn min_score_zero_keeps_every_matched_item() {
    let m = TopicMatcher::default();
    let input = vec![
        "nasa confirms the launch window".to_string(),
        "spacex books another orbit mission".to_string(),
    ];
    let out = m.filter_by_topic(input, "space", 0.0, |s| s.clone());
    assert_eq!(out.len(), 2);
}

#[test]
fn many_synonyms_can_match_with_low_score() {
    let m = TopicMatcher::default();
    // One keyword hit against the large finance set: matched, but weak.
    let res = m.match_topic("the banking sector had a calm week", "finance");
    assert!(res.matched);
    assert!(res.score < 0.5);
}
