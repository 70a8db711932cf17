//! Integration tests for the query builder.

use std::sync::Arc;
use std::time::Duration;

use vitals::{MockClock, QueryMode, Store, StoreConfig};

const SEC: u64 = 1_000_000_000;
const T0: u64 = 1_700_000_000 * SEC;

/// Three labelled series sharing the sample layout `t0 + i s -> i`.
fn labelled_store(clock: Arc<MockClock>) -> Store {
    let store = Store::with_clock(StoreConfig::default(), clock);
    let series = [
        ("honey.cpu", "honey", "cpu"),
        ("honey.mem", "honey", "mem"),
        ("yoga.cpu", "yoga", "cpu"),
    ];

    for (name, host, metric) in series {
        store.set_labels(name, [("host", host), ("metric", metric)]);
        for i in 0u32..10 {
            store.add_point(name, T0 + u64::from(i) * SEC, f64::from(i));
        }
    }
    store
}

#[test]
fn test_label_query() {
    let store = labelled_store(Arc::new(MockClock::with_nanos(T0)));

    let mut names: Vec<_> = store
        .query_by_label("host", "honey")
        .execute()
        .into_iter()
        .map(|s| s.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["honey.cpu", "honey.mem"]);

    let cpu: Vec<_> = store
        .query_by_label("metric", "cpu")
        .execute()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(cpu, vec!["honey.cpu", "yoga.cpu"]);

    assert!(store.query_by_label("host", "nowhere").execute().is_empty());
    assert!(store.query_by_label("rack", "honey").execute().is_empty());
}

#[test]
fn test_label_query_follows_relabel_and_delete() {
    let store = labelled_store(Arc::new(MockClock::with_nanos(T0)));

    store.set_labels("yoga.cpu", [("host", "honey")]);
    store.delete_series("honey.mem");

    let names: Vec<_> = store
        .query_by_label("host", "honey")
        .execute()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["honey.cpu", "yoga.cpu"]);
}

#[test]
fn test_modes_against_primitives() {
    let store = labelled_store(Arc::new(MockClock::with_nanos(T0 + 9 * SEC)));

    let full = store.query("honey.cpu").execute();
    assert_eq!(full, vec![store.get_series("honey.cpu").unwrap()]);

    let between = store.query("honey.cpu").between(T0 + 3 * SEC, T0 + 6 * SEC).execute();
    assert_eq!(
        between,
        vec![store.get_range("honey.cpu", T0 + 3 * SEC, T0 + 6 * SEC).unwrap()]
    );

    let last = store.query("honey.cpu").last(4).execute();
    assert_eq!(last, vec![store.get_latest_n("honey.cpu", 4).unwrap()]);

    let since = store.query("honey.cpu").since(Duration::from_secs(2)).execute();
    assert_eq!(since[0].values, vec![7.0, 8.0, 9.0]);
}

#[test]
fn test_since_moves_with_clock() {
    let clock = Arc::new(MockClock::with_nanos(T0 + 5 * SEC));
    let store = labelled_store(Arc::clone(&clock));

    let query = store.query_by_label("host", "yoga").since(Duration::from_secs(1));
    assert_eq!(query.mode(), QueryMode::Since(Duration::from_secs(1)));
    assert_eq!(query.execute()[0].values, vec![4.0, 5.0]);

    clock.advance(Duration::from_secs(3));
    assert_eq!(query.execute()[0].values, vec![7.0, 8.0]);

    clock.advance(Duration::from_secs(60));
    let stale = query.execute();
    assert_eq!(stale.len(), 1, "series still exists");
    assert!(stale[0].is_empty());
}

#[test]
fn test_empty_window_keeps_identity() {
    let store = labelled_store(Arc::new(MockClock::with_nanos(T0)));

    let results = store.query("yoga.cpu").between(T0 + 100 * SEC, T0 + 200 * SEC).execute();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_empty());
    assert_eq!(results[0].name, "yoga.cpu");
    assert_eq!(results[0].labels.get("metric").map(String::as_str), Some("cpu"));
}

#[test]
fn test_query_aggregates_for_dashboard() {
    let store = labelled_store(Arc::new(MockClock::with_nanos(T0)));

    let panel = store.query_by_label("metric", "cpu").last(5).execute();
    for series in &panel {
        assert_eq!(series.len(), 5);
        assert_eq!(series.min(), 5.0);
        assert_eq!(series.max(), 9.0);
        assert_eq!(series.avg(), 7.0);
        assert_eq!(series.last(), 9.0);
    }
}
