//! End-to-end grouping behaviour of the cluster store.

use logspark_core::sparkline;
use logspark_core::store::{ClusterStore, PushOutcome, SharedStore};
use logspark_core::trend::TREND_WIDTH;
use logspark_core::Record;
use serde_json::json;

fn record(v: serde_json::Value) -> Record {
    v.as_object().cloned().expect("fixture must be an object")
}

#[test]
fn similar_messages_collapse_and_different_ones_split() {
    let store = SharedStore::new(ClusterStore::new(3, vec!["msg".to_string()]));

    store.push(record(json!({"msg": "error reading file A"})));
    store.push(record(json!({"msg": "error reading file B"})));

    let snap = store.snapshot();
    assert_eq!(snap.rows.len(), 1);
    assert_eq!(snap.rows[0].count, 2);
    assert_eq!(snap.rows[0].values, ["error reading file B"]);

    let outcome = store.push(record(json!({"msg": "completely different event"})));
    assert_eq!(outcome, PushOutcome::Created(1));

    let snap = store.snapshot();
    assert_eq!(snap.rows.len(), 2);
    assert_eq!(snap.rows[0].count, 2);
    assert_eq!(snap.rows[1].count, 1);
}

#[test]
fn trend_history_renders_as_sparkline_after_aging() {
    let store = SharedStore::new(ClusterStore::new(3, vec!["msg".to_string()]));

    // Bucket loads 1, 2, 3, ... in successive windows.
    for bucket in 1..=TREND_WIDTH {
        for _ in 0..bucket {
            store.push(record(json!({"msg": "GET /health 200 ok"})));
        }
        if bucket < TREND_WIDTH {
            store.shift();
        }
    }

    let snap = store.snapshot();
    let row = &snap.rows[0];
    assert_eq!(row.trend, [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(row.count, 28);
    assert_eq!(sparkline::render(&row.trend), "▁▂▃▄▅▆▇");

    for _ in 0..TREND_WIDTH {
        store.shift();
    }
    let snap = store.snapshot();
    assert!(snap.rows[0].trend.iter().all(|&n| n == 0));
    assert_eq!(sparkline::render(&snap.rows[0].trend), "▁".repeat(TREND_WIDTH));
}

#[test]
fn derived_fields_drive_later_classification() {
    let store = SharedStore::new(ClusterStore::new(2, Vec::new()));

    store.push(record(json!({"level": "error", "code": 500})));
    assert_eq!(store.fields(), ["code", "level"]);

    // Keys: [500 500 error error] vs [500 500 error error] → merge.
    store.push(record(json!({"level": "error", "code": 500, "extra": true})));
    // [404 404 error error] differs by 2 substitutions → new cluster.
    store.push(record(json!({"level": "error", "code": 404})));

    let snap = store.snapshot();
    assert_eq!(snap.rows.len(), 2);
    assert_eq!(snap.rows[0].count, 2);
    assert_eq!(snap.rows[1].values, ["404", "error"]);
}
