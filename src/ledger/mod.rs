//! Balance ledger.
//!
//! Every change to a user's balance or spend/earn counters goes through a
//! store transaction on the whole user document, so concurrent admin
//! actions on the same user never lose an update. Balances are allowed to
//! go negative (a manual deduction can overdraw); that case is logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::interfaces::{DocumentStore, StoreError, TxnDecision};
use crate::models::lenient::{count_of, decimal_of, decimal_value};
use crate::models::paths;
use crate::utils::time::month_key;

const BALANCE: &str = "balance";
const TOTAL_SPENT: &str = "totalSpent";
const TOTAL_DEPOSIT: &str = "totalDeposit";
const TOTAL_EARNED: &str = "totalEarned";
const MONTHLY_SPENT: &str = "monthlySpent";
const MONTHLY_EARNED: &str = "monthlyEarned";
const LAST_MONTH_UPDATE: &str = "lastMonthUpdate";
const TOTAL_ADS_WATCHED: &str = "totalAdsWatched";

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(Decimal),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Direction of a manual balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Add,
    Deduct,
}

impl Adjustment {
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Adjustment::Add => amount,
            Adjustment::Deduct => -amount,
        }
    }
}

/// Balance before and after a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub before: Decimal,
    pub after: Decimal,
}

/// Atomic updates to user balances and counters.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn DocumentStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Add a signed `delta` to the user's balance.
    #[tracing::instrument(name = "ledger.adjust", skip_all, fields(user_id = %uid, delta = %delta))]
    pub async fn adjust(&self, uid: &str, delta: Decimal) -> Result<BalanceChange> {
        let doc = self
            .mutate(uid, |user| {
                add(user, BALANCE, delta);
            })
            .await?;
        Ok(balance_change(&doc, delta, uid))
    }

    /// Admin top-up or deduction. The amount must be positive.
    pub async fn apply_manual_adjustment(
        &self,
        uid: &str,
        direction: Adjustment,
        amount: Decimal,
    ) -> Result<BalanceChange> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.adjust(uid, direction.signed(amount)).await
    }

    /// Count a completed purchase towards lifetime and monthly spend.
    ///
    /// The monthly counter restarts at `price` when `now` falls in a new
    /// month; monthly earnings are kept as they are.
    #[tracing::instrument(name = "ledger.record_purchase", skip_all, fields(user_id = %uid, price = %price))]
    pub async fn record_purchase(&self, uid: &str, price: Decimal, now: DateTime<Utc>) -> Result<()> {
        let month = month_key(now);
        self.mutate(uid, |user| {
            add(user, TOTAL_SPENT, price);
            if rolled_over(user, &month) {
                user.insert(MONTHLY_SPENT.to_string(), decimal_value(price));
                let earned = field(user, MONTHLY_EARNED);
                user.insert(MONTHLY_EARNED.to_string(), decimal_value(earned));
                user.insert(LAST_MONTH_UPDATE.to_string(), Value::String(month.clone()));
            } else {
                add(user, MONTHLY_SPENT, price);
            }
        })
        .await?;
        Ok(())
    }

    /// Credit an approved deposit: balance and lifetime deposit together.
    #[tracing::instrument(name = "ledger.record_deposit", skip_all, fields(user_id = %uid, amount = %amount))]
    pub async fn record_deposit(&self, uid: &str, amount: Decimal) -> Result<BalanceChange> {
        let doc = self
            .mutate(uid, |user| {
                add(user, BALANCE, amount);
                add(user, TOTAL_DEPOSIT, amount);
            })
            .await?;
        Ok(balance_change(&doc, amount, uid))
    }

    /// Credit an ad reward to balance, lifetime and monthly earnings.
    #[tracing::instrument(name = "ledger.record_ad_earning", skip_all, fields(user_id = %uid, amount = %amount))]
    pub async fn record_ad_earning(
        &self,
        uid: &str,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<BalanceChange> {
        let month = month_key(now);
        let doc = self
            .mutate(uid, |user| {
                add(user, BALANCE, amount);
                add(user, TOTAL_EARNED, amount);
                let watched = user.get(TOTAL_ADS_WATCHED).map_or(0, count_of);
                user.insert(TOTAL_ADS_WATCHED.to_string(), Value::from(watched + 1));
                if rolled_over(user, &month) {
                    user.insert(MONTHLY_EARNED.to_string(), decimal_value(amount));
                    let spent = field(user, MONTHLY_SPENT);
                    user.insert(MONTHLY_SPENT.to_string(), decimal_value(spent));
                    user.insert(LAST_MONTH_UPDATE.to_string(), Value::String(month.clone()));
                } else {
                    add(user, MONTHLY_EARNED, amount);
                }
            })
            .await?;
        Ok(balance_change(&doc, amount, uid))
    }

    /// Run `apply` against the user document inside a store transaction.
    ///
    /// `apply` may run several times; it must derive everything from the
    /// map it is given. Returns the committed document.
    async fn mutate<F>(&self, uid: &str, mut apply: F) -> Result<Map<String, Value>>
    where
        F: FnMut(&mut Map<String, Value>) + Send,
    {
        let path = paths::user(uid);
        let outcome = self
            .store
            .transaction(&path, &mut |current: Option<&Value>| match current {
                Some(Value::Object(doc)) => {
                    let mut doc = doc.clone();
                    apply(&mut doc);
                    TxnDecision::Commit(Some(Value::Object(doc)))
                }
                _ => TxnDecision::Abort,
            })
            .await?;

        match outcome.value {
            Some(Value::Object(doc)) if outcome.committed => {
                debug!(user_id = %uid, "Ledger update committed");
                Ok(doc)
            }
            _ => Err(LedgerError::UserNotFound(uid.to_string())),
        }
    }
}

fn field(user: &Map<String, Value>, name: &str) -> Decimal {
    user.get(name).map_or(Decimal::ZERO, decimal_of)
}

fn add(user: &mut Map<String, Value>, name: &str, delta: Decimal) {
    let next = field(user, name) + delta;
    user.insert(name.to_string(), decimal_value(next));
}

fn rolled_over(user: &Map<String, Value>, month: &str) -> bool {
    user.get(LAST_MONTH_UPDATE).and_then(Value::as_str) != Some(month)
}

fn balance_change(doc: &Map<String, Value>, delta: Decimal, uid: &str) -> BalanceChange {
    let after = field(doc, BALANCE);
    if after.is_sign_negative() && !after.is_zero() {
        warn!(user_id = %uid, balance = %after, "Balance is negative after ledger update");
    }
    BalanceChange {
        before: after - delta,
        after,
    }
}
