//! Integration tests for indexing and ranked search over a stored corpus

use article_lens::search::IndexHandle;
use article_lens::storage::{Article, CorpusStore, SqliteStorage};
use std::sync::Arc;

fn scenario_store() -> SqliteStorage {
    let store = SqliteStorage::new_in_memory().expect("in-memory store");
    store
        .append(
            &Article::new("https://blog.test/a", "education policy reform", 50),
            false,
        )
        .unwrap();
    store
        .append(
            &Article::new("https://blog.test/b", "deep learning basics", 200),
            false,
        )
        .unwrap();
    store
}

#[test]
fn test_scenario_machine_learning_returns_b() {
    let store = scenario_store();
    let handle = IndexHandle::default();
    handle.rebuild_blocking(&store).unwrap();

    let hits = handle.search("machine learning", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "https://blog.test/b");
}

#[test]
fn test_scenario_unrelated_query_orders_by_claps() {
    let store = scenario_store();
    let handle = IndexHandle::default();
    handle.rebuild_blocking(&store).unwrap();

    let hits = handle.search("unrelated xyz term", 2).unwrap();
    let urls: Vec<_> = hits.iter().map(|h| h.url.as_str()).collect();
    assert_eq!(urls, vec!["https://blog.test/b", "https://blog.test/a"]);
}

#[test]
fn test_empty_query_leaves_state_untouched() {
    let store = scenario_store();
    let handle = IndexHandle::default();
    let built = handle.rebuild_blocking(&store).unwrap();

    assert!(handle.search("", 5).is_err());
    assert!(Arc::ptr_eq(&built, &handle.current()));
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_append_then_rebuild_grows_by_one() {
    let store = scenario_store();
    let handle = IndexHandle::default();
    let before = handle.rebuild_blocking(&store).unwrap();

    store
        .append(
            &Article::new("https://blog.test/c", "a short note", 0),
            false,
        )
        .unwrap();
    let after = handle.rebuild_blocking(&store).unwrap();

    assert_eq!(after.article_count(), before.article_count() + 1);
    assert!(after.vocabulary_size() >= before.vocabulary_size());
}

#[test]
fn test_scores_stay_in_unit_range_and_results_are_bounded() {
    let store = scenario_store();
    for i in 0..5 {
        store
            .append(
                &Article::new(
                    format!("https://blog.test/extra-{}", i),
                    format!("learning systems part {}", i),
                    i,
                )
                .with_content("Distributed learning systems scale training across machines."),
                false,
            )
            .unwrap();
    }
    let handle = IndexHandle::default();
    handle.rebuild_blocking(&store).unwrap();

    for top_k in [0, 1, 3, 7, 100] {
        let hits = handle.search("learning systems", top_k).unwrap();
        assert!(hits.len() <= top_k.min(7));
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    }
}
