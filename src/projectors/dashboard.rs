//! Dashboard aggregates, re-derived from the users, orders and
//! transactions listings.
//!
//! Each listing owns a slice of the [`Dashboard`]: a change to orders only
//! recomputes the order figures. "Today" is the calendar day of the
//! projector's clock in the configured timezone.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::interfaces::{DocumentStore, Query, Record, Result, Subscription};
use crate::models::{paths, Order, RequestStatus, Transaction, User};
use crate::utils::task::{stopped, TaskHandle};
use crate::utils::time::{Clock, DayBoundary};

/// Figures derived from the users listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFigures {
    pub total_users: usize,
    /// Σ totalEarned: what the app paid out for watched ads.
    pub total_ad_revenue: Decimal,
    pub active_gamers: usize,
    pub users_total_balance: Decimal,
    /// Σ aiRequestCount.
    pub ai_interactions: u64,
    /// Users whose last AI interaction was today.
    pub active_ai_users: usize,
}

/// Figures derived from the orders listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFigures {
    pub pending_orders: usize,
    /// Σ charge of orders completed today.
    pub today_purchase: Decimal,
}

/// Figures derived from the transactions listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositFigures {
    pub pending_deposits: usize,
    pub today_deposit: Decimal,
    pub today_ad_revenue: Decimal,
    /// Σ completed deposits, all time (within the fetch window).
    pub total_deposit: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub users: UserFigures,
    pub orders: OrderFigures,
    pub deposits: DepositFigures,
}

/// Reduction rules.
#[derive(Debug, Clone, Copy)]
pub struct DashboardRules {
    pub gamer_level_threshold: u32,
    pub day: DayBoundary,
}

impl From<&DashboardConfig> for DashboardRules {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            gamer_level_threshold: config.gamer_level_threshold,
            day: DayBoundary::new(config.utc_offset_minutes),
        }
    }
}

impl Default for DashboardRules {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

impl DashboardRules {
    fn is_today(&self, at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        at.is_some_and(|at| self.day.same_day(at, now))
    }

    pub fn user_figures(&self, users: &[User], now: DateTime<Utc>) -> UserFigures {
        let mut figures = UserFigures {
            total_users: users.len(),
            ..UserFigures::default()
        };
        for user in users {
            figures.total_ad_revenue += user.total_earned;
            figures.users_total_balance += user.balance;
            figures.ai_interactions += user.ai_request_count;
            if user.unlocked_level() >= self.gamer_level_threshold {
                figures.active_gamers += 1;
            }
            if self.is_today(user.last_ai_interaction, now) {
                figures.active_ai_users += 1;
            }
        }
        figures
    }

    pub fn order_figures(&self, orders: &[Order], now: DateTime<Utc>) -> OrderFigures {
        let mut figures = OrderFigures::default();
        for order in orders {
            match order.status {
                RequestStatus::Pending => figures.pending_orders += 1,
                RequestStatus::Completed if self.is_today(order.date, now) => {
                    figures.today_purchase += order.charge();
                }
                _ => {}
            }
        }
        figures
    }

    pub fn deposit_figures(&self, txns: &[Transaction], now: DateTime<Utc>) -> DepositFigures {
        let mut figures = DepositFigures::default();
        for txn in txns {
            let today = self.is_today(txn.date, now);
            if txn.is_ad_reward() {
                if today {
                    figures.today_ad_revenue += txn.amount;
                }
                continue;
            }
            match txn.status {
                RequestStatus::Pending => figures.pending_deposits += 1,
                RequestStatus::Completed => {
                    figures.total_deposit += txn.amount;
                    if today {
                        figures.today_deposit += txn.amount;
                    }
                }
                _ => {}
            }
        }
        figures
    }

    /// Compute the whole dashboard at once.
    pub fn summarize(
        &self,
        users: &[User],
        orders: &[Order],
        txns: &[Transaction],
        now: DateTime<Utc>,
    ) -> Dashboard {
        Dashboard {
            users: self.user_figures(users, now),
            orders: self.order_figures(orders, now),
            deposits: self.deposit_figures(txns, now),
        }
    }
}

fn users_of(records: &[Record]) -> Vec<User> {
    records.iter().filter_map(User::from_record).collect()
}

fn orders_of(records: &[Record]) -> Vec<Order> {
    records.iter().filter_map(Order::from_record).collect()
}

fn transactions_of(records: &[Record]) -> Vec<Transaction> {
    records.iter().filter_map(Transaction::from_record).collect()
}

enum Change {
    Stop,
    Users(Vec<Record>),
    Orders(Vec<Record>),
    Transactions(Vec<Record>),
    Closed(&'static str),
}

/// Keeps a [`Dashboard`] current from three live listings.
pub struct DashboardProjector {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: DashboardConfig,
}

impl DashboardProjector {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, config: DashboardConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// One-shot computation over the same bounded listings the live
    /// projector uses.
    pub async fn snapshot(&self) -> Result<Dashboard> {
        let limit = self.config.fetch_limit;
        let users = self.store.query(paths::USERS, &users_query(limit)).await?;
        let orders = self.store.query(paths::ORDERS, &dated_query(limit)).await?;
        let txns = self
            .store
            .query(paths::TRANSACTIONS, &dated_query(limit))
            .await?;
        let rules = DashboardRules::from(&self.config);
        Ok(rules.summarize(
            &users_of(&users),
            &orders_of(&orders),
            &transactions_of(&txns),
            self.clock.now(),
        ))
    }

    /// Subscribe and publish a fresh [`Dashboard`] after every change.
    pub async fn start(self) -> Result<(watch::Receiver<Dashboard>, TaskHandle)> {
        let limit = self.config.fetch_limit;
        let mut users = self.store.listen(paths::USERS, users_query(limit)).await?;
        let mut orders = self.store.listen(paths::ORDERS, dated_query(limit)).await?;
        let mut txns = self
            .store
            .listen(paths::TRANSACTIONS, dated_query(limit))
            .await?;

        let (tx, rx) = watch::channel(Dashboard::default());
        let rules = DashboardRules::from(&self.config);
        let clock = self.clock;

        let handle = TaskHandle::spawn("dashboard", move |mut shutdown| async move {
            info!(fetch_limit = limit, "Dashboard projector started");
            loop {
                let change = tokio::select! {
                    _ = stopped(&mut shutdown) => Change::Stop,
                    next = users.next() => next.map_or(Change::Closed("users"), Change::Users),
                    next = orders.next() => next.map_or(Change::Closed("orders"), Change::Orders),
                    next = txns.next() => next.map_or(Change::Closed("transactions"), Change::Transactions),
                };

                let now = clock.now();
                let modified = match change {
                    Change::Stop => break,
                    Change::Closed(source) => {
                        warn!(source, "Dashboard listener closed");
                        break;
                    }
                    Change::Users(records) => {
                        let figures = rules.user_figures(&users_of(&records), now);
                        tx.send_if_modified(|d| replace(&mut d.users, figures))
                    }
                    Change::Orders(records) => {
                        let figures = rules.order_figures(&orders_of(&records), now);
                        tx.send_if_modified(|d| replace(&mut d.orders, figures))
                    }
                    Change::Transactions(records) => {
                        let figures = rules.deposit_figures(&transactions_of(&records), now);
                        tx.send_if_modified(|d| replace(&mut d.deposits, figures))
                    }
                };
                if modified {
                    debug!("Dashboard updated");
                }
            }
            close(users, orders, txns);
            info!("Dashboard projector stopped");
        });

        Ok((rx, handle))
    }
}

fn users_query(limit: usize) -> Query {
    Query::children().limit_to_last(limit)
}

fn dated_query(limit: usize) -> Query {
    Query::grandchildren()
        .order_by_child("date")
        .limit_to_last(limit)
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn close(users: Subscription, orders: Subscription, txns: Subscription) {
    users.close();
    orders.close();
    txns.close();
}

#[cfg(test)]
mod tests;
