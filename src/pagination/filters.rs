//! Client-side filtering over the fetched window.
//!
//! Filters only ever see what the current page fetched; a search does not
//! reach records beyond the loaded limit.

use chrono::{DateTime, Utc};

use crate::models::{Order, RequestStatus, Transaction, User};
use crate::projectors::DashboardRules;

/// How the user list is narrowed or re-sorted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserListMode {
    #[default]
    All,
    /// Users at or above the gamer level threshold.
    ActiveGamers,
    /// Sorted by lifetime ad earnings.
    AdRevenue,
    /// Sorted by balance.
    Balance,
    /// Sorted by AI request count.
    AiUsage,
    /// Users who talked to the AI assistant today.
    AiActiveToday,
}

fn matches(term: &str, fields: &[Option<&str>]) -> bool {
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(term))
}

fn search_term(search: &str) -> Option<String> {
    let term = search.trim();
    (!term.is_empty()).then(|| term.to_lowercase())
}

/// Apply a list mode, then a search over name, email, uid and player id.
pub fn filter_users(
    users: &[User],
    mode: UserListMode,
    search: &str,
    rules: &DashboardRules,
    now: DateTime<Utc>,
) -> Vec<User> {
    let mut list: Vec<User> = match mode {
        UserListMode::ActiveGamers => users
            .iter()
            .filter(|u| u.unlocked_level() >= rules.gamer_level_threshold)
            .cloned()
            .collect(),
        UserListMode::AiActiveToday => users
            .iter()
            .filter(|u| {
                u.last_ai_interaction
                    .is_some_and(|at| rules.day.same_day(at, now))
            })
            .cloned()
            .collect(),
        _ => users.to_vec(),
    };
    match mode {
        UserListMode::AdRevenue => list.sort_by(|a, b| b.total_earned.cmp(&a.total_earned)),
        UserListMode::Balance => list.sort_by(|a, b| b.balance.cmp(&a.balance)),
        UserListMode::AiUsage => list.sort_by(|a, b| b.ai_request_count.cmp(&a.ai_request_count)),
        _ => {}
    }

    let Some(term) = search_term(search) else {
        return list;
    };
    list.retain(|u| {
        matches(
            &term,
            &[
                Some(u.name.as_str()),
                Some(u.email.as_str()),
                Some(u.uid.as_str()),
                u.player_uid.as_deref(),
            ],
        )
    });
    list
}

/// Orders with `status`, searched by order id or player id.
pub fn filter_orders(orders: &[Order], status: RequestStatus, search: &str) -> Vec<Order> {
    let term = search_term(search);
    orders
        .iter()
        .filter(|o| o.status == status)
        .filter(|o| {
            term.as_deref()
                .is_none_or(|t| matches(t, &[Some(o.id.as_str()), Some(o.uid.as_str())]))
        })
        .cloned()
        .collect()
}

/// Deposits with `status`, searched by payment reference or method.
pub fn filter_deposits(txns: &[Transaction], status: RequestStatus, search: &str) -> Vec<Transaction> {
    let term = search_term(search);
    txns.iter()
        .filter(|t| t.status == status)
        .filter(|t| {
            term.as_deref().is_none_or(|term| {
                matches(term, &[t.transaction_id.as_deref(), Some(t.method.as_str())])
            })
        })
        .cloned()
        .collect()
}
