//! In-memory document store.
//!
//! Holds the whole database as one JSON tree behind a tokio `RwLock`.
//! Every write broadcasts the written path; live queries re-evaluate when
//! a write overlaps their path. Used by the daemon (optionally seeded from
//! an export file) and by tests.

use std::sync::Arc;

use async_trait::async_trait;
use backon::{BackoffBuilder, ExponentialBuilder};
use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{query, tree};
use crate::interfaces::{
    DocumentStore, Query, Record, Result, StoreError, Subscription, TxnDecision, TxnFn,
    TxnOutcome,
};
use crate::utils::retry::transaction_backoff;

/// Broadcast capacity for change notifications.
const CHANGE_CAPACITY: usize = 1024;
/// Per-subscription buffer of pending results.
const SUBSCRIPTION_BUFFER: usize = 16;
/// Default transaction retries, matching the hosted store.
pub const DEFAULT_TRANSACTION_RETRIES: usize = 25;

struct Inner {
    root: RwLock<Value>,
    changes: broadcast::Sender<Arc<Vec<String>>>,
    fail_writes: RwLock<bool>,
}

/// In-memory [`DocumentStore`].
///
/// Cloning is cheap and yields a handle to the same tree.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
    backoff: ExponentialBuilder,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Create a store holding `root` (e.g. a database export).
    pub fn from_value(root: Value) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                root: RwLock::new(tree::normalize(root).unwrap_or_else(|| Value::Object(Map::new()))),
                changes,
                fail_writes: RwLock::new(false),
            }),
            backoff: transaction_backoff(DEFAULT_TRANSACTION_RETRIES),
        }
    }

    /// Override how often a conflicting transaction is retried.
    pub fn with_transaction_retries(mut self, retries: usize) -> Self {
        self.backoff = transaction_backoff(retries);
        self
    }

    /// Copy of the whole tree.
    pub async fn export(&self) -> Value {
        self.inner.root.read().await.clone()
    }

    /// Make every mutation fail with [`StoreError::Unavailable`].
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.inner.fail_writes.write().await = fail;
    }

    async fn check_writable(&self) -> Result<()> {
        if *self.inner.fail_writes.read().await {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }

    fn notify(&self, segs: &[&str]) {
        let path: Vec<String> = segs.iter().map(|s| s.to_string()).collect();
        // No receivers just means nobody is listening.
        let _ = self.inner.changes.send(Arc::new(path));
    }

    async fn write(&self, path: &str, value: Option<Value>) -> Result<()> {
        self.check_writable().await?;
        let segs = tree::segments(path)?;
        {
            let mut root = self.inner.root.write().await;
            tree::write(&mut root, &segs, value);
        }
        self.notify(&segs);
        Ok(())
    }

    async fn snapshot(inner: &Inner, segs: &[String], query: &Query) -> Vec<Record> {
        let segs: Vec<&str> = segs.iter().map(String::as_str).collect();
        let root = inner.root.read().await;
        query::evaluate(tree::lookup(&root, &segs), query)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let segs = tree::segments(path)?;
        let root = self.inner.root.read().await;
        Ok(tree::lookup(&root, &segs).cloned())
    }

    #[tracing::instrument(name = "store.set", skip_all, fields(path = %path))]
    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.write(path, Some(value)).await
    }

    #[tracing::instrument(name = "store.update", skip_all, fields(path = %path))]
    async fn update(&self, path: &str, patch: Value) -> Result<()> {
        let Value::Object(fields) = patch else {
            return Err(StoreError::InvalidPatch(path.to_string()));
        };
        self.check_writable().await?;
        let segs = tree::segments(path)?;
        // Every key must be valid before anything is written.
        let writes = fields
            .iter()
            .map(|(key, value)| -> Result<(Vec<&str>, Value)> {
                let mut full = segs.clone();
                full.extend(tree::segments(key)?);
                Ok((full, value.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        {
            let mut root = self.inner.root.write().await;
            for (full, value) in writes {
                tree::write(&mut root, &full, Some(value));
            }
        }
        self.notify(&segs);
        Ok(())
    }

    #[tracing::instrument(name = "store.remove", skip_all, fields(path = %path))]
    async fn remove(&self, path: &str) -> Result<()> {
        self.write(path, None).await
    }

    #[tracing::instrument(name = "store.push", skip_all, fields(path = %path))]
    async fn push(&self, path: &str, value: Value) -> Result<String> {
        let key = Uuid::now_v7().simple().to_string();
        let full = format!("{}/{}", path.trim_end_matches('/'), key);
        self.write(&full, Some(value)).await?;
        Ok(key)
    }

    #[tracing::instrument(name = "store.transaction", skip_all, fields(path = %path))]
    async fn transaction(&self, path: &str, update: &mut TxnFn<'_>) -> Result<TxnOutcome> {
        let segs = tree::segments(path)?;
        let mut delays = self.backoff.clone().build();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let current = {
                let root = self.inner.root.read().await;
                tree::lookup(&root, &segs).cloned()
            };

            let proposed = match update(current.as_ref()) {
                TxnDecision::Abort => {
                    return Ok(TxnOutcome {
                        committed: false,
                        value: current,
                    })
                }
                TxnDecision::Commit(value) => value.and_then(tree::normalize),
            };

            self.check_writable().await?;
            {
                let mut root = self.inner.root.write().await;
                if tree::lookup(&root, &segs) == current.as_ref() {
                    tree::write(&mut root, &segs, proposed.clone());
                    drop(root);
                    self.notify(&segs);
                    return Ok(TxnOutcome {
                        committed: true,
                        value: proposed,
                    });
                }
            }

            match delays.next() {
                Some(delay) => {
                    debug!(attempt, delay = ?delay, "Concurrent write during transaction, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(attempt, "Transaction retries exhausted");
                    return Err(StoreError::TransactionConflict {
                        path: path.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
    }

    async fn query(&self, path: &str, query: &Query) -> Result<Vec<Record>> {
        let segs: Vec<String> = tree::segments(path)?.into_iter().map(String::from).collect();
        Ok(Self::snapshot(&self.inner, &segs, query).await)
    }

    async fn listen(&self, path: &str, query: Query) -> Result<Subscription> {
        let segs: Vec<String> = tree::segments(path)?.into_iter().map(String::from).collect();
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);

        // Subscribe before the first snapshot so no write slips in between.
        let mut changes = self.inner.changes.subscribe();
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            let initial = Self::snapshot(&inner, &segs, &query).await;
            if sender.send(initial).await.is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(changed) => {
                        if !tree::overlaps(&segs, &changed) {
                            continue;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Listener lagged, re-evaluating");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let records = Self::snapshot(&inner, &segs, &query).await;
                if sender.send(records).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(receiver, task))
    }
}

#[cfg(test)]
mod tests;
