//! The three paged collections the console lists.

use std::cmp::Ordering;

use crate::interfaces::{Query, Record};
use crate::models::{paths, Order, Transaction, User};

/// A collection that can be listed a growing window at a time.
pub trait Source: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    fn path(&self) -> &'static str;

    /// The bounded query for a window of `limit` records.
    fn query(&self, limit: usize) -> Query;

    /// Decode a result, largest or newest first.
    fn items(&self, records: &[Record]) -> Vec<Self::Item>;
}

/// Users by lifetime spend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

impl Source for Users {
    type Item = User;

    fn name(&self) -> &'static str {
        "users"
    }

    fn path(&self) -> &'static str {
        paths::USERS
    }

    fn query(&self, limit: usize) -> Query {
        Query::children()
            .order_by_child("totalSpent")
            .limit_to_last(limit)
    }

    fn items(&self, records: &[Record]) -> Vec<User> {
        let mut users: Vec<User> = records.iter().filter_map(User::from_record).collect();
        users.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
        users
    }
}

/// Orders across all users, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Orders;

impl Source for Orders {
    type Item = Order;

    fn name(&self) -> &'static str {
        "orders"
    }

    fn path(&self) -> &'static str {
        paths::ORDERS
    }

    fn query(&self, limit: usize) -> Query {
        newest(limit)
    }

    fn items(&self, records: &[Record]) -> Vec<Order> {
        let mut orders: Vec<Order> = records.iter().filter_map(Order::from_record).collect();
        orders.sort_by(|a, b| newest_first(a.date, b.date));
        orders
    }
}

/// Deposits across all users, newest first. Ad rewards are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deposits;

impl Source for Deposits {
    type Item = Transaction;

    fn name(&self) -> &'static str {
        "deposits"
    }

    fn path(&self) -> &'static str {
        paths::TRANSACTIONS
    }

    fn query(&self, limit: usize) -> Query {
        newest(limit)
    }

    fn items(&self, records: &[Record]) -> Vec<Transaction> {
        let mut txns: Vec<Transaction> = records
            .iter()
            .filter_map(Transaction::from_record)
            .filter(|t| !t.is_ad_reward())
            .collect();
        txns.sort_by(|a, b| newest_first(a.date, b.date));
        txns
    }
}

fn newest(limit: usize) -> Query {
    Query::grandchildren()
        .order_by_child("date")
        .limit_to_last(limit)
}

/// Undated records sort last.
fn newest_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
