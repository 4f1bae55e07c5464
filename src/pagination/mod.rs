//! Growing-window listings for the admin tables.
//!
//! A [`PagedList`] keeps one live query open over a [`Source`] and
//! publishes every result as a [`Page`]. `load_more` widens the window by
//! one page and re-subscribes; the previous items stay visible (state
//! [`LoadState::Loading`]) until the wider result arrives.

pub mod filters;
pub mod sources;

pub use filters::{filter_deposits, filter_orders, filter_users, UserListMode};
pub use sources::{Deposits, Orders, Source, Users};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::PaginationConfig;
use crate::interfaces::{DocumentStore, Record, Result};
use crate::utils::task::{stopped, TaskHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Populated,
    Empty,
}

/// The latest result of a paged listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Window size the items were fetched with.
    pub limit: usize,
    /// The store returned a full window, so more records probably exist.
    /// A collection of exactly `limit` records also reports `true`.
    pub has_more: bool,
    pub state: LoadState,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            limit: 0,
            has_more: false,
            state: LoadState::Idle,
        }
    }
}

impl<T> Page<T> {
    fn fill(&mut self, items: Vec<T>, records: usize, limit: usize) {
        self.state = if items.is_empty() {
            LoadState::Empty
        } else {
            LoadState::Populated
        };
        self.has_more = records >= limit;
        self.limit = limit;
        self.items = items;
    }
}

/// Live, growing listing of one [`Source`].
pub struct PagedList<S: Source> {
    store: Arc<dyn DocumentStore>,
    source: Arc<S>,
    page_size: usize,
    limit: usize,
    page: Arc<watch::Sender<Page<S::Item>>>,
    listener: Option<TaskHandle>,
}

impl<S: Source> PagedList<S> {
    pub fn new(store: Arc<dyn DocumentStore>, source: S, config: &PaginationConfig) -> Self {
        let (page, _) = watch::channel(Page::default());
        Self {
            store,
            source: Arc::new(source),
            page_size: config.page_size.max(1),
            limit: config.page_size.max(1),
            page: Arc::new(page),
            listener: None,
        }
    }

    /// Receive every published page.
    pub fn subscribe(&self) -> watch::Receiver<Page<S::Item>> {
        self.page.subscribe()
    }

    pub fn state(&self) -> LoadState {
        self.page.borrow().state
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Start listening with the current window. Reopening an open list
    /// restarts its listener.
    pub async fn open(&mut self) -> Result<()> {
        self.restart().await
    }

    /// Widen the window by one page.
    pub async fn load_more(&mut self) -> Result<()> {
        self.limit += self.page_size;
        debug!(source = self.source.name(), limit = self.limit, "Loading more");
        self.restart().await
    }

    /// Stop listening and forget the loaded items. The window shrinks back
    /// to one page.
    pub async fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
        self.limit = self.page_size;
        self.page.send_replace(Page::default());
    }

    async fn restart(&mut self) -> Result<()> {
        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
        self.page.send_modify(|p| p.state = LoadState::Loading);

        let limit = self.limit;
        let mut subscription = match self
            .store
            .listen(self.source.path(), self.source.query(limit))
            .await
        {
            Ok(subscription) => subscription,
            Err(e) => {
                self.page.send_modify(|p| p.state = LoadState::Idle);
                return Err(e);
            }
        };

        let source = Arc::clone(&self.source);
        let page = Arc::clone(&self.page);
        self.listener = Some(TaskHandle::spawn(source.name(), move |mut shutdown| async move {
            info!(source = source.name(), limit, "Listing opened");
            loop {
                let next: Option<Vec<Record>> = tokio::select! {
                    _ = stopped(&mut shutdown) => break,
                    next = subscription.next() => next,
                };
                let Some(records) = next else {
                    warn!(source = source.name(), "Listing listener closed");
                    break;
                };
                let items = source.items(&records);
                debug!(
                    source = source.name(),
                    records = records.len(),
                    items = items.len(),
                    "Listing refreshed"
                );
                page.send_modify(|p| p.fill(items, records.len(), limit));
            }
            subscription.close();
        }));
        Ok(())
    }
}
