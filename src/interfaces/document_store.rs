//! DocumentStore trait definition.
//!
//! The hosted realtime database is an external collaborator. Everything in
//! this crate talks to it through this trait: JSON documents addressed by
//! `/`-separated paths, atomic read-modify-write on a single path, and live
//! ordered queries bounded to the last N records.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Update patch for '{0}' must be a JSON object")]
    InvalidPatch(String),

    #[error("Transaction on '{path}' gave up after {attempts} attempts")]
    TransactionConflict { path: String, attempts: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to load seed '{path}': {reason}")]
    Seed { path: String, reason: String },
}

/// Ordering applied to a query before `limit_to_last`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrderBy {
    /// Order by record key.
    #[default]
    Key,
    /// Order by a child field of each record (`/` separates nested fields).
    Child(String),
}

/// Which level of the tree below the query path forms the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Direct children of the path (`users/{uid}`).
    #[default]
    Children,
    /// Children of children (`orders/{uid}/{key}`), flattened.
    Grandchildren,
}

/// A bounded, ordered query over the records below a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub order_by: OrderBy,
    pub limit_to_last: Option<usize>,
    pub scope: Scope,
}

impl Query {
    /// Query over direct children, ordered by key.
    pub fn children() -> Self {
        Self::default()
    }

    /// Query over grandchildren, ordered by key.
    pub fn grandchildren() -> Self {
        Self {
            scope: Scope::Grandchildren,
            ..Self::default()
        }
    }

    pub fn order_by_child(mut self, field: impl Into<String>) -> Self {
        self.order_by = OrderBy::Child(field.into());
        self
    }

    pub fn order_by_key(mut self) -> Self {
        self.order_by = OrderBy::Key;
        self
    }

    pub fn limit_to_last(mut self, limit: usize) -> Self {
        self.limit_to_last = Some(limit);
        self
    }
}

/// One record returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Key of the parent node for grandchild queries (the owning user).
    pub parent: Option<String>,
    /// Key of the record itself.
    pub key: String,
    pub value: Value,
}

impl Record {
    /// Decode the record body, ignoring records that do not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.value.clone()).ok()
    }
}

/// What a transaction update function decided for the current value.
#[derive(Debug, Clone, PartialEq)]
pub enum TxnDecision {
    /// Write the value; `None` deletes the node.
    Commit(Option<Value>),
    /// Leave the node untouched.
    Abort,
}

/// Result of a store transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TxnOutcome {
    /// Whether the update function's value was written.
    pub committed: bool,
    /// The node value after the transaction.
    pub value: Option<Value>,
}

/// Update function passed to [`DocumentStore::transaction`].
///
/// May be invoked more than once: the store re-runs it whenever another
/// writer changed the node between read and write.
pub type TxnFn<'a> = dyn FnMut(Option<&Value>) -> TxnDecision + Send + 'a;

/// Live query handle.
///
/// Yields the current result immediately and a fresh result after every
/// write touching the subscribed path. Dropping the handle stops the
/// listener task.
pub struct Subscription {
    receiver: mpsc::Receiver<Vec<Record>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<Vec<Record>>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task: Some(task),
        }
    }

    /// Wait for the next result. `None` once the listener has stopped.
    pub async fn next(&mut self) -> Option<Vec<Record>> {
        self.receiver.recv().await
    }

    /// Stop listening.
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.task.is_some())
            .finish()
    }
}

/// Interface for the realtime document store.
///
/// Implementations:
/// - `MemoryStore`: in-process tree, used by the daemon and in tests
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `None` if nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Full write. Writing `null` removes the node.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Shallow merge of `patch` (a JSON object) into the node at `path`.
    ///
    /// `null` fields remove the corresponding child.
    async fn update(&self, path: &str, patch: Value) -> Result<()>;

    /// Delete the node at `path`.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Append `value` under a generated, time-ordered key. Returns the key.
    async fn push(&self, path: &str, value: Value) -> Result<String>;

    /// Atomic read-modify-write on a single node.
    ///
    /// No lost updates: if the node changed between the read handed to
    /// `update` and the write, `update` runs again against the new value.
    async fn transaction(&self, path: &str, update: &mut TxnFn<'_>) -> Result<TxnOutcome>;

    /// One-shot query.
    async fn query(&self, path: &str, query: &Query) -> Result<Vec<Record>>;

    /// Live query.
    async fn listen(&self, path: &str, query: Query) -> Result<Subscription>;
}

/// Typed helpers over [`DocumentStore`].
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Point read decoded into `T`.
    async fn get_as<T: DeserializeOwned + Send>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn set_as<T: Serialize + Sync>(&self, path: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(path, value).await
    }

    async fn push_as<T: Serialize + Sync>(&self, path: &str, value: &T) -> Result<String> {
        let value = serde_json::to_value(value)?;
        self.push(path, value).await
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}
