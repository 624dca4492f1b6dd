// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the pending operation store.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::error::Error;
use crate::op::{AdjustInventory, CancelBooking};
use tempfile::{tempdir, TempDir};

fn adjust(sku: &str) -> Operation {
    Operation::AdjustInventory(AdjustInventory {
        sku: sku.to_string(),
        delta: -1,
        reason: None,
    })
}

fn open_store(dir: &TempDir) -> PendingStore {
    PendingStore::open(&dir.path().join("pending.jsonl")).unwrap()
}

#[test]
fn open_creates_empty_file() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir);
    assert!(store.is_empty());
    assert_eq!(store.count(), 0);
    assert!(dir.path().join("pending.jsonl").exists());
}

#[test]
fn list_returns_enqueue_order() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);

    let ids: Vec<OpId> = ["a", "b", "c", "d"]
        .iter()
        .map(|sku| store.enqueue(adjust(sku)).unwrap().id)
        .collect();

    let listed: Vec<OpId> = store.list().iter().map(|op| op.id).collect();
    assert_eq!(listed, ids);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn enqueue_persists_immediately() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pending.jsonl");
    let mut store = PendingStore::open(&path).unwrap();
    store.enqueue(adjust("a")).unwrap();

    let on_disk: Vec<PendingOperation> = jsonl::read_all(&path).unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].kind(), "adjust-inventory");
    assert_eq!(on_disk[0].attempts, 0);
}

#[test]
fn enqueue_rejects_invalid_operation() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    let err = store
        .enqueue(Operation::CancelBooking(CancelBooking {
            booking_id: String::new(),
        }))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { .. }));
    assert_eq!(store.count(), 0);
}

#[test]
fn list_is_a_detached_snapshot() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    store.enqueue(adjust("a")).unwrap();

    let mut snapshot = store.list();
    snapshot.clear();

    assert_eq!(store.count(), 1);
}

#[test]
fn remove_is_idempotent() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.enqueue(adjust("a")).unwrap();
    let b = store.enqueue(adjust("b")).unwrap();

    assert!(store.remove(a.id).unwrap());
    assert!(!store.remove(a.id).unwrap());

    assert_eq!(store.list(), vec![b]);
}

#[test]
fn requeue_keeps_id_and_goes_to_tail() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.enqueue(adjust("a")).unwrap();
    store.increment_attempts(a.id, Some("timeout")).unwrap();
    let a = store.get(a.id).unwrap();
    store.remove(a.id).unwrap();
    let b = store.enqueue(adjust("b")).unwrap();

    let requeued = store.requeue(a.clone()).unwrap();

    assert_eq!(requeued.id, a.id);
    assert_eq!(requeued.attempts, 0);
    assert_eq!(requeued.last_error, None);
    let ids: Vec<OpId> = open_store(&dir).list().iter().map(|op| op.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
}

#[test]
fn requeue_of_pending_id_is_noop() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.enqueue(adjust("a")).unwrap();

    assert_eq!(store.requeue(a.clone()).unwrap(), a);
    assert_eq!(store.count(), 1);
}

#[test]
fn remove_unknown_id_is_noop() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    store.enqueue(adjust("a")).unwrap();

    assert!(!store.remove(OpId::new(1, 0)).unwrap());
    assert_eq!(store.count(), 1);
}

#[test]
fn increment_attempts_keeps_order() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.enqueue(adjust("a")).unwrap();
    let b = store.enqueue(adjust("b")).unwrap();

    assert_eq!(store.increment_attempts(a.id, Some("timeout")).unwrap(), Some(1));
    assert_eq!(store.increment_attempts(a.id, None).unwrap(), Some(2));

    let ops = store.list();
    assert_eq!(ops[0].id, a.id);
    assert_eq!(ops[0].attempts, 2);
    assert_eq!(ops[0].last_error.as_deref(), Some("timeout"));
    assert_eq!(ops[1].id, b.id);
    assert_eq!(ops[1].attempts, 0);
}

#[test]
fn increment_attempts_unknown_id() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    assert_eq!(store.increment_attempts(OpId::new(1, 0), None).unwrap(), None);
}

#[test]
fn survives_reopen_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pending.jsonl");

    let written = {
        let mut store = PendingStore::open(&path).unwrap();
        vec![
            store.enqueue(adjust("a")).unwrap(),
            store.enqueue(adjust("b")).unwrap(),
            store.enqueue(adjust("c")).unwrap(),
        ]
    };

    let store = PendingStore::open(&path).unwrap();
    assert_eq!(store.list(), written);
}

#[test]
fn ids_stay_monotonic_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pending.jsonl");

    // An id far in the future, as if written under a skewed clock
    let future = PendingOperation::new(OpId::new(u64::MAX / 2, 0), adjust("a"));
    jsonl::append(&path, &future).unwrap();

    let mut store = PendingStore::open(&path).unwrap();
    let next = store.enqueue(adjust("b")).unwrap();
    assert!(next.id > future.id);
}

#[test]
fn refresh_sees_other_writers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pending.jsonl");
    let mut watcher = PendingStore::open(&path).unwrap();
    let mut cli = PendingStore::open(&path).unwrap();

    cli.enqueue(adjust("a")).unwrap();
    assert_eq!(watcher.count(), 0);

    watcher.refresh().unwrap();
    assert_eq!(watcher.count(), 1);
}

#[test]
fn mutations_merge_with_other_writers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pending.jsonl");
    let mut first = PendingStore::open(&path).unwrap();
    let mut second = PendingStore::open(&path).unwrap();

    let a = first.enqueue(adjust("a")).unwrap();
    second.enqueue(adjust("b")).unwrap();

    // `first` has not seen b yet; removing a must not drop it
    first.remove(a.id).unwrap();

    let reopened = PendingStore::open(&path).unwrap();
    assert_eq!(reopened.count(), 1);
    assert_eq!(reopened.list()[0].operation, adjust("b"));
}

#[test]
fn clear_drops_everything() {
    let dir = tempdir().unwrap();
    let mut store = open_store(&dir);
    store.enqueue(adjust("a")).unwrap();
    store.enqueue(adjust("b")).unwrap();

    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.is_empty());
    assert_eq!(store.clear().unwrap(), 0);
}

#[test]
fn serialized_shape_flattens_operation() {
    let op = PendingOperation::new(OpId::new(10, 2), adjust("a"));
    let json = serde_json::to_value(&op).unwrap();
    assert_eq!(json["kind"], "adjust-inventory");
    assert_eq!(json["payload"]["sku"], "a");
    assert_eq!(json["id"]["wall_ms"], 10);
    assert!(json.get("last_error").is_none());
}
