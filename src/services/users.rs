//! Admin actions on user accounts.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::Result;
use super::messages;
use super::notifications::NotificationService;
use crate::interfaces::{DocumentStore, DocumentStoreExt};
use crate::ledger::{Adjustment, BalanceChange, Ledger};
use crate::models::{paths, NotificationKind, User};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
    ledger: Ledger,
    notifier: NotificationService,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>, ledger: Ledger, notifier: NotificationService) -> Self {
        Self {
            store,
            ledger,
            notifier,
        }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<User>> {
        let user: Option<User> = self.store.get_as(&paths::user(uid)).await?;
        Ok(user.map(|mut u| {
            u.uid = uid.to_string();
            u
        }))
    }

    /// Manual top-up or deduction, followed by a "Balance Update" notice.
    #[tracing::instrument(name = "users.adjust_balance", skip_all, fields(user_id = %uid, ?direction, %amount))]
    pub async fn adjust_balance(
        &self,
        uid: &str,
        direction: Adjustment,
        amount: Decimal,
    ) -> Result<BalanceChange> {
        let change = self
            .ledger
            .apply_manual_adjustment(uid, direction, amount)
            .await?;
        info!(before = %change.before, after = %change.after, "Balance adjusted by admin");

        let text = messages::balance_updated(amount, direction == Adjustment::Add);
        if let Err(e) = self
            .notifier
            .send_triggered(uid, NotificationKind::Admin, &text)
            .await
        {
            warn!(error = %e, "Failed to send balance update notification");
        }
        Ok(change)
    }
}
