use super::*;
use crate::interfaces::DocumentStoreExt;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_set_get_remove() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({"name": "Rafi", "balance": 10})).await.unwrap();

    assert_eq!(
        store.get("users/u1/name").await.unwrap(),
        Some(json!("Rafi"))
    );

    store.remove("users/u1").await.unwrap();
    assert_eq!(store.get("users/u1").await.unwrap(), None);
    assert_eq!(store.get("users").await.unwrap(), None);
}

#[tokio::test]
async fn test_update_merges_and_null_removes() {
    let store = MemoryStore::new();
    store
        .set("config/appSettings", json!({"appName": "Top", "notice": "hi"}))
        .await
        .unwrap();

    store
        .update(
            "config/appSettings",
            json!({"notice": null, "maintenanceMode": true}),
        )
        .await
        .unwrap();

    assert_eq!(
        store.get("config/appSettings").await.unwrap(),
        Some(json!({"appName": "Top", "maintenanceMode": true}))
    );
}

#[tokio::test]
async fn test_update_rejects_non_object_patch() {
    let store = MemoryStore::new();
    let result = store.update("config", json!(5)).await;
    assert!(matches!(result, Err(StoreError::InvalidPatch(_))));
}

#[tokio::test]
async fn test_update_with_invalid_key_writes_nothing() {
    let store = MemoryStore::new();
    store.set("config", json!({"x": 0})).await.unwrap();
    let mut sub = store.listen("config", Query::children()).await.unwrap();
    sub.next().await.unwrap();

    let result = store.update("config", json!({"a": 1, "b.c": 2})).await;
    assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    assert_eq!(store.get("config").await.unwrap(), Some(json!({"x": 0})));

    store.update("config", json!({"a": 1})).await.unwrap();
    let next = sub.next().await.unwrap();
    assert_eq!(next.len(), 2);
}

#[tokio::test]
async fn test_push_keys_are_time_ordered() {
    let store = MemoryStore::new();
    let first = store.push("notifications", json!({"n": 1})).await.unwrap();
    let second = store.push("notifications", json!({"n": 2})).await.unwrap();
    assert!(first < second);

    let records = store
        .query("notifications", &Query::children())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].value, json!({"n": 2}));
}

#[tokio::test]
async fn test_typed_helpers() {
    let store = MemoryStore::new();
    store.set_as("users/u1/balance", &42).await.unwrap();
    let balance: Option<i64> = store.get_as("users/u1/balance").await.unwrap();
    assert_eq!(balance, Some(42));
}

#[tokio::test]
async fn test_transaction_commit_and_abort() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({"balance": 5})).await.unwrap();

    let outcome = store
        .transaction("users/u1", &mut |current: Option<&Value>| {
            let mut doc = current.cloned().unwrap_or_else(|| json!({}));
            doc["balance"] = json!(doc["balance"].as_i64().unwrap_or(0) + 7);
            TxnDecision::Commit(Some(doc))
        })
        .await
        .unwrap();
    assert!(outcome.committed);
    assert_eq!(outcome.value, Some(json!({"balance": 12})));

    let outcome = store
        .transaction("users/u1", &mut |_: Option<&Value>| TxnDecision::Abort)
        .await
        .unwrap();
    assert!(!outcome.committed);
    assert_eq!(outcome.value, Some(json!({"balance": 12})));
}

#[tokio::test]
async fn test_transaction_commit_none_deletes() {
    let store = MemoryStore::new();
    store.set("orders/u1/o1", json!({"status": "Pending"})).await.unwrap();

    let outcome = store
        .transaction("orders/u1/o1", &mut |_: Option<&Value>| TxnDecision::Commit(None))
        .await
        .unwrap();

    assert!(outcome.committed);
    assert_eq!(store.get("orders/u1/o1").await.unwrap(), None);
}

#[tokio::test]
async fn test_transaction_reruns_after_concurrent_write() {
    let store = MemoryStore::new();
    store.set("users/u1/balance", json!(100)).await.unwrap();

    let inner = Arc::clone(&store.inner);
    let mut calls = 0;
    let outcome = store
        .transaction("users/u1/balance", &mut |current: Option<&Value>| {
            calls += 1;
            if calls == 1 {
                // Simulate another writer landing between read and write.
                let mut root = inner.root.try_write().expect("lock is free during update");
                tree::write(&mut root, &["users", "u1", "balance"], Some(json!(150)));
            }
            let balance = current.and_then(Value::as_i64).unwrap_or(0);
            TxnDecision::Commit(Some(json!(balance + 1)))
        })
        .await
        .unwrap();

    assert_eq!(calls, 2);
    assert_eq!(outcome.value, Some(json!(151)));
    assert_eq!(store.get("users/u1/balance").await.unwrap(), Some(json!(151)));
}

#[tokio::test]
async fn test_transaction_gives_up_when_budget_exhausted() {
    let store = MemoryStore::new().with_transaction_retries(2);
    store.set("users/u1/balance", json!(0)).await.unwrap();

    let inner = Arc::clone(&store.inner);
    let mut n = 0;
    let result = store
        .transaction("users/u1/balance", &mut |_: Option<&Value>| {
            n += 1;
            let mut root = inner.root.try_write().expect("lock is free during update");
            tree::write(&mut root, &["users", "u1", "balance"], Some(json!(1000 + n)));
            TxnDecision::Commit(Some(json!(-1)))
        })
        .await;

    assert!(matches!(
        result,
        Err(StoreError::TransactionConflict { attempts: 3, .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transactions_lose_no_updates() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({"balance": 0})).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .transaction("users/u1", &mut |current: Option<&Value>| {
                    let mut doc = current.cloned().unwrap_or_else(|| json!({}));
                    doc["balance"] = json!(doc["balance"].as_i64().unwrap_or(0) + 5);
                    TxnDecision::Commit(Some(doc))
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        store.get("users/u1/balance").await.unwrap(),
        Some(json!(100))
    );
}

#[tokio::test]
async fn test_fail_writes() {
    let store = MemoryStore::new();
    store.set_fail_writes(true).await;
    assert!(matches!(
        store.set("users/u1", json!({})).await,
        Err(StoreError::Unavailable(_))
    ));
    store.set_fail_writes(false).await;
    assert!(store.set("users/u1", json!({"a": 1})).await.is_ok());
}

#[tokio::test]
async fn test_listen_emits_initial_and_on_change() {
    let store = MemoryStore::new();
    store.set("users/u1", json!({"totalSpent": 5})).await.unwrap();

    let mut sub = store
        .listen("users", Query::children().order_by_child("totalSpent"))
        .await
        .unwrap();

    let initial = sub.next().await.unwrap();
    assert_eq!(initial.len(), 1);

    store.set("users/u2", json!({"totalSpent": 1})).await.unwrap();
    let updated = sub.next().await.unwrap();
    assert_eq!(updated.len(), 2);
    assert_eq!(updated[0].key, "u2");
}

#[tokio::test]
async fn test_listen_ignores_unrelated_paths() {
    let store = MemoryStore::new();
    let mut sub = store.listen("orders", Query::grandchildren()).await.unwrap();
    assert!(sub.next().await.unwrap().is_empty());

    store.set("users/u1", json!({"balance": 1})).await.unwrap();
    store.set("orders/u1/o1", json!({"status": "Pending"})).await.unwrap();

    let next = sub.next().await.unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].parent.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_closed_subscription_stops_listener() {
    let store = MemoryStore::new();
    let sub = store.listen("users", Query::children()).await.unwrap();
    sub.close();

    // Writes after close must not block or panic.
    store.set("users/u1", json!({"a": 1})).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(store.inner.changes.receiver_count(), 0);
}
