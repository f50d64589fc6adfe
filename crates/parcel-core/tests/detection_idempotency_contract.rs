//! Contract: change detection is idempotent and the notified set only grows
//!
//! Constraints verified:
//! - Two checks seeing the same latest event report it once
//! - The second check writes nothing and leaves the notified set unchanged
//! - Across any sequence of checks the notified set never shrinks
//! - Fingerprints survive a restart of the file store
//! - An event whose fingerprint could not be stored is reported again next cycle

mod common;

use common::*;
use parcel_core::{FileParcelStore, ParcelStore, TrackingNumber};
use std::sync::Arc;

const NUMBER: &str = "1Z999AA10123456784";

#[tokio::test]
async fn identical_latest_event_is_reported_once() {
    let provider = Arc::new(ScriptedProvider::universal("scripted"));
    provider.answer(NUMBER, Answer::Events(vec![event("2024-03-01 10:00", "In transit")]));

    let store = Arc::new(CountingStore::new());
    let tracker = tracker(store.clone(), resolver(&[provider.clone()]), 1);
    tracker.add(NUMBER, None, None).await.unwrap();
    let number = TrackingNumber::parse(NUMBER).unwrap();

    let first = tracker.check().await.unwrap();
    assert_eq!(first.updates.len(), 1);
    let after_first = store.get(&number).await.unwrap().unwrap();
    assert_eq!(after_first.notified.len(), 1);
    let mutations_after_first = store.mutations();

    let second = tracker.check().await.unwrap();
    assert!(second.updates.is_empty());
    let after_second = store.get(&number).await.unwrap().unwrap();
    assert_eq!(after_second.notified, after_first.notified);
    assert_eq!(store.mutations(), mutations_after_first);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn notified_set_is_monotonic() {
    let provider = Arc::new(ScriptedProvider::universal("scripted"));
    let store = Arc::new(CountingStore::new());
    let tracker = tracker(store.clone(), resolver(&[provider.clone()]), 1);
    tracker.add(NUMBER, None, None).await.unwrap();
    let number = TrackingNumber::parse(NUMBER).unwrap();

    let polls = [
        Answer::Events(vec![event("t1", "Shipped")]),
        Answer::Nothing,
        Answer::Events(vec![event("t2", "In transit"), event("t1", "Shipped")]),
        Answer::Fail,
        Answer::Events(vec![event("t1", "Shipped")]),
        Answer::Events(vec![event("t3", "Delivered"), event("t2", "In transit")]),
    ];

    let mut sizes = Vec::new();
    for answer in polls {
        provider.answer(NUMBER, answer);
        tracker.check().await.unwrap();
        sizes.push(store.get(&number).await.unwrap().unwrap().notified.len());
    }

    assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "sizes: {:?}", sizes);
    assert_eq!(sizes.last(), Some(&3));
}

#[tokio::test]
async fn fingerprints_survive_store_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parcels.json");

    let provider = Arc::new(ScriptedProvider::universal("scripted"));
    provider.answer(NUMBER, Answer::Events(vec![event("2024-03-01 10:00", "In transit")]));

    {
        let store = Arc::new(FileParcelStore::new(&path).await.unwrap());
        let tracker = tracker(store, resolver(&[provider.clone()]), 1);
        tracker.add(NUMBER, None, None).await.unwrap();
        assert_eq!(tracker.check().await.unwrap().updates.len(), 1);
    }

    let store = Arc::new(FileParcelStore::new(&path).await.unwrap());
    let tracker = tracker(store, resolver(&[provider.clone()]), 1);
    assert!(tracker.check().await.unwrap().updates.is_empty());
}

#[tokio::test]
async fn failed_store_write_reports_event_next_cycle() {
    let provider = Arc::new(ScriptedProvider::universal("scripted"));
    provider.answer(NUMBER, Answer::Events(vec![event("2024-03-01 10:00", "In transit")]));

    let store = Arc::new(CountingStore::new());
    let tracker = tracker(store.clone(), resolver(&[provider.clone()]), 1);
    tracker.add(NUMBER, None, None).await.unwrap();
    let number = TrackingNumber::parse(NUMBER).unwrap();

    store.fail_next_update();
    let failed = tracker.check().await.unwrap();
    assert!(failed.updates.is_empty());
    assert_eq!(failed.failed, [number.clone()]);
    assert!(store.get(&number).await.unwrap().unwrap().notified.is_empty());

    let retried = tracker.check().await.unwrap();
    assert_eq!(retried.updates.len(), 1);
    assert_eq!(retried.updates[0].event.status, "In transit");
    assert!(retried.failed.is_empty());
}

#[tokio::test]
async fn failed_file_write_reports_event_next_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parcels.json");

    let provider = Arc::new(ScriptedProvider::universal("scripted"));
    provider.answer("QQ1", Answer::Events(vec![event("2024-03-01 10:00", "Delivered")]));
    provider.answer("QQ2", Answer::Events(vec![event("2024-03-01 11:00", "Shipped")]));

    let store = Arc::new(FileParcelStore::new(&path).await.unwrap());
    let tracker = tracker(store.clone(), resolver(&[provider.clone()]), 1);
    tracker.add("QQ1", None, None).await.unwrap();

    // Block the temp file so the fingerprint write for QQ1 fails
    let blocker = dir.path().join("parcels.tmp");
    tokio::fs::create_dir(&blocker).await.unwrap();
    let failed = tracker.check().await.unwrap();
    assert!(failed.updates.is_empty());
    assert_eq!(failed.failed.len(), 1);
    tokio::fs::remove_dir(&blocker).await.unwrap();

    // A later successful write must not carry the lost fingerprint along
    tracker.add("QQ2", None, None).await.unwrap();
    let reopened = FileParcelStore::new(&path).await.unwrap();
    let qq1 = TrackingNumber::parse("QQ1").unwrap();
    assert!(reopened.get(&qq1).await.unwrap().unwrap().notified.is_empty());

    let retried = tracker.check().await.unwrap();
    let mut reported: Vec<String> = retried
        .updates
        .iter()
        .map(|u| u.tracking_number.to_string())
        .collect();
    reported.sort();
    assert_eq!(reported, ["QQ1", "QQ2"]);
}
