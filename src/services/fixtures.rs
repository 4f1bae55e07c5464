//! Shared setup for service tests.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use super::deposits::DepositService;
use super::notifications::NotificationService;
use super::orders::OrderService;
use super::settings_sync;
use crate::expiry::ExpiryScheduler;
use crate::interfaces::{DocumentStore, Query};
use crate::ledger::Ledger;
use crate::models::lenient::decimal_of;
use crate::models::{paths, AppSettings, Notification, Order, Transaction};
use crate::storage::MemoryStore;
use crate::utils::time::{Clock, ManualClock};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

pub fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub scheduler: Arc<ExpiryScheduler>,
    pub ledger: Ledger,
    pub notifier: NotificationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(AppSettings::default())
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let store = MemoryStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let clock = Arc::new(ManualClock::new(epoch()));
        let notifier =
            NotificationService::new(Arc::clone(&shared), settings_sync::fixed(settings), clock.clone());
        Self {
            ledger: Ledger::new(Arc::clone(&shared)),
            scheduler: Arc::new(ExpiryScheduler::new()),
            store,
            clock,
            notifier,
        }
    }

    pub fn shared_store(&self) -> Arc<dyn DocumentStore> {
        Arc::new(self.store.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(
            self.shared_store(),
            self.ledger.clone(),
            self.notifier.clone(),
            Arc::clone(&self.scheduler),
            self.clock.clone(),
        )
    }

    pub fn deposits(&self) -> DepositService {
        DepositService::new(self.shared_store(), self.ledger.clone(), self.notifier.clone())
    }

    pub async fn seed_user(&self, uid: &str, balance: i64) {
        self.store
            .set(&paths::user(uid), json!({"name": uid, "balance": balance}))
            .await
            .unwrap();
    }

    /// Seed a Pending order placed `minutes_ago` before the clock's now.
    pub async fn seed_order(&self, uid: &str, key: &str, price: i64, minutes_ago: i64) -> Order {
        let placed = self.clock_now() - chrono::Duration::minutes(minutes_ago);
        let path = paths::order(uid, key);
        self.store
            .set(
                &path,
                json!({
                    "id": format!("ORD-{key}"),
                    "offer": {"name": "Weekly Pass", "price": price},
                    "price": price,
                    "date": stamp(placed),
                    "status": "Pending",
                    "uid": "99887766",
                    "userId": uid,
                }),
            )
            .await
            .unwrap();
        self.order(uid, key).await.unwrap()
    }

    pub async fn seed_deposit(&self, uid: &str, key: &str, amount: i64) -> Transaction {
        let path = paths::transaction(uid, key);
        self.store
            .set(
                &path,
                json!({
                    "id": format!("TXN-{key}"),
                    "amount": amount,
                    "date": stamp(self.clock_now()),
                    "method": "bKash",
                    "status": "Pending",
                    "type": "deposit",
                    "transactionId": "8N7A6B5C",
                    "userId": uid,
                }),
            )
            .await
            .unwrap();
        self.deposit(uid, key).await.unwrap()
    }

    pub async fn order(&self, uid: &str, key: &str) -> Option<Order> {
        let value = self.store.get(&paths::order(uid, key)).await.unwrap()?;
        let mut order: Order = serde_json::from_value(value).ok()?;
        order.key = key.to_string();
        order.user_id = uid.to_string();
        Some(order)
    }

    pub async fn deposit(&self, uid: &str, key: &str) -> Option<Transaction> {
        let value = self.store.get(&paths::transaction(uid, key)).await.unwrap()?;
        let mut txn: Transaction = serde_json::from_value(value).ok()?;
        txn.key = key.to_string();
        txn.user_id = uid.to_string();
        Some(txn)
    }

    pub async fn field(&self, uid: &str, name: &str) -> Decimal {
        let path = format!("{}/{name}", paths::user(uid));
        self.store
            .get(&path)
            .await
            .unwrap()
            .as_ref()
            .map_or(Decimal::ZERO, decimal_of)
    }

    pub async fn balance(&self, uid: &str) -> Decimal {
        self.field(uid, "balance").await
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.store
            .query(paths::NOTIFICATIONS, &Query::children())
            .await
            .unwrap()
            .iter()
            .filter_map(Notification::from_record)
            .collect()
    }

    fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
