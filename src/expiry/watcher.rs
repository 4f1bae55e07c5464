//! Periodic auto-refund loop.

use std::collections::HashSet;
use std::sync::Arc;

use backon::BackoffBuilder;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::ExpiryScheduler;
use crate::config::WatcherConfig;
use crate::interfaces::{DocumentStore, Query, Record, Subscription};
use crate::models::{paths, Order};
use crate::services::{OrderService, ServiceError, SettingsWatch};
use crate::utils::retry::resubscribe_backoff;
use crate::utils::task::{stopped, TaskHandle};
use crate::utils::time::Clock;

/// Outcome of one pass over the due orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Auto-refund is switched off; nothing was attempted.
    pub disabled: bool,
    /// Orders deleted and refunded by this pass.
    pub expired: usize,
    /// Orders someone else resolved first.
    pub resolved_elsewhere: usize,
    /// Orders kept for the next pass (store errors, newer dates).
    pub retried: usize,
}

enum Event {
    Stop,
    Orders(Option<Vec<Record>>),
    Tick,
}

/// Watches pending orders and expires them once their window has passed.
pub struct ExpiryWatcher {
    store: Arc<dyn DocumentStore>,
    orders: OrderService,
    scheduler: Arc<ExpiryScheduler>,
    settings: SettingsWatch,
    clock: Arc<dyn Clock>,
    config: WatcherConfig,
}

impl ExpiryWatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        orders: OrderService,
        scheduler: Arc<ExpiryScheduler>,
        settings: SettingsWatch,
        clock: Arc<dyn Clock>,
        config: WatcherConfig,
    ) -> Self {
        Self {
            store,
            orders,
            scheduler,
            settings,
            clock,
            config,
        }
    }

    /// The live query the watcher schedules from: the newest orders across
    /// all users, bounded by the scan limit.
    pub fn query(&self) -> Query {
        Query::grandchildren()
            .order_by_child("date")
            .limit_to_last(self.config.scan_limit)
    }

    /// Bring the schedule in line with the latest order listing.
    ///
    /// Pending orders are (re)scheduled; anything no longer pending, or no
    /// longer listed, is dropped.
    pub fn reconcile(&self, records: &[Record]) {
        let mut live = HashSet::new();
        let mut added = 0;
        for order in records.iter().filter_map(Order::from_record) {
            if !order.is_pending() {
                continue;
            }
            if self.scheduler.schedule(&order) {
                added += 1;
            }
            live.insert(order.path());
        }
        let dropped = self.scheduler.retain(&live);
        if added > 0 || dropped > 0 {
            debug!(added, dropped, tracked = self.scheduler.len(), "Expiry schedule updated");
        }
    }

    /// Expire every due order once.
    pub async fn tick(&self) -> TickReport {
        let (active, timeout) = {
            let settings = self.settings.borrow();
            (settings.auto_refund_active, settings.auto_refund_timeout())
        };
        if !active {
            debug!("Auto-refund disabled, skipping pass");
            return TickReport {
                disabled: true,
                ..TickReport::default()
            };
        }

        let now = self.clock.now();
        let mut report = TickReport::default();
        for order in self.scheduler.due(now, timeout) {
            let path = order.path();
            match self.orders.expire(&order, now, timeout).await {
                Ok(_) => report.expired += 1,
                Err(ServiceError::NotPending { .. } | ServiceError::NotFound(_)) => {
                    debug!(order = %path, "Order already resolved");
                    self.scheduler.cancel(&path);
                    report.resolved_elsewhere += 1;
                }
                Err(ServiceError::NotDue(_)) => {
                    // The stored date is newer than ours; the listener will
                    // bring the new date in.
                    report.retried += 1;
                }
                Err(ServiceError::Store(e)) => {
                    warn!(order = %path, error = %e, "Auto-refund failed, will retry");
                    report.retried += 1;
                }
                Err(e) => {
                    error!(order = %path, error = %e, "Auto-refund failed");
                    self.scheduler.cancel(&path);
                }
            }
        }
        if report.expired > 0 {
            info!(expired = report.expired, "Auto-refund pass finished");
        }
        report
    }

    /// Subscribe to orders and run the poll loop until stopped.
    pub async fn start(self) -> crate::interfaces::Result<TaskHandle> {
        let subscription = self.store.listen(paths::ORDERS, self.query()).await?;
        let period = self.config.poll_interval();

        Ok(TaskHandle::spawn("expiry-watcher", move |mut shutdown| async move {
            info!(poll_interval = ?period, scan_limit = self.config.scan_limit, "Expiry watcher started");
            let mut subscription = Some(subscription);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let Some(sub) = subscription.as_mut() else {
                    break;
                };
                let event = tokio::select! {
                    _ = stopped(&mut shutdown) => Event::Stop,
                    next = sub.next() => Event::Orders(next),
                    _ = ticker.tick() => Event::Tick,
                };

                match event {
                    Event::Stop => break,
                    Event::Orders(Some(records)) => self.reconcile(&records),
                    Event::Orders(None) => {
                        warn!("Order listener closed, resubscribing");
                        subscription = tokio::select! {
                            _ = stopped(&mut shutdown) => break,
                            resumed = self.resubscribe() => resumed,
                        };
                    }
                    Event::Tick => {
                        self.tick().await;
                    }
                }
            }
            info!("Expiry watcher stopped");
        }))
    }

    async fn resubscribe(&self) -> Option<Subscription> {
        let mut delays = resubscribe_backoff().build();
        loop {
            match self.store.listen(paths::ORDERS, self.query()).await {
                Ok(subscription) => return Some(subscription),
                Err(e) => match delays.next() {
                    Some(delay) => {
                        warn!(error = %e, delay = ?delay, "Resubscribe failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        error!(error = %e, "Giving up on the order listener");
                        return None;
                    }
                },
            }
        }
    }
}
