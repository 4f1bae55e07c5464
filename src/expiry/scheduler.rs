//! Expiry schedule keyed by order.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::models::Order;

/// Pending orders waiting for their auto-refund deadline.
///
/// Keyed by order path (`orders/{userId}/{key}`). The expiry watcher keeps
/// it in step with the store; manual resolution cancels an entry so the
/// watcher never sees an order an admin already handled.
#[derive(Debug, Default)]
pub struct ExpiryScheduler {
    entries: Mutex<HashMap<String, Order>>,
}

impl ExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Order>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a pending order. Orders without a readable date are ignored.
    ///
    /// Returns true when the order was not tracked before.
    pub fn schedule(&self, order: &Order) -> bool {
        if !order.is_pending() || order.date.is_none() {
            return false;
        }
        self.entries().insert(order.path(), order.clone()).is_none()
    }

    /// Stop tracking an order. Returns true if it was tracked.
    pub fn cancel(&self, path: &str) -> bool {
        self.entries().remove(path).is_some()
    }

    /// Drop every entry whose path is not in `live`.
    pub fn retain(&self, live: &HashSet<String>) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|path, _| live.contains(path));
        before - entries.len()
    }

    /// Orders whose deadline has passed at `now`, oldest first.
    pub fn due(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> Vec<Order> {
        let mut due: Vec<Order> = self
            .entries()
            .values()
            .filter(|order| order.is_expired(now, timeout))
            .cloned()
            .collect();
        due.sort_by_key(|order| order.date);
        due
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
