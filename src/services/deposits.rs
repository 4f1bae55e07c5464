//! Deposit resolution: approve, reject, delete.
//!
//! Ad rewards live in the same collection but are credited by the app
//! itself; they are refused here.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{error, info, warn};

use super::claim::{claim, Claim, Resolution};
use super::error::{Result, ServiceError};
use super::messages;
use super::notifications::NotificationService;
use crate::interfaces::DocumentStore;
use crate::ledger::Ledger;
use crate::models::{Localized, NotificationKind, RequestStatus, Transaction};

#[derive(Clone)]
pub struct DepositService {
    store: Arc<dyn DocumentStore>,
    ledger: Ledger,
    notifier: NotificationService,
}

impl DepositService {
    pub fn new(store: Arc<dyn DocumentStore>, ledger: Ledger, notifier: NotificationService) -> Self {
        Self {
            store,
            ledger,
            notifier,
        }
    }

    /// Pending → Completed, crediting balance and lifetime deposits.
    #[tracing::instrument(name = "deposits.approve", skip_all, fields(deposit = %txn.path()))]
    pub async fn approve(&self, txn: &Transaction) -> Result<Resolution> {
        let path = txn.path();
        let claimed = self.claim(txn, RequestStatus::Completed).await?;

        let amount = claimed.amount;
        if let Err(e) = self.ledger.record_deposit(&claimed.user_id, amount).await {
            error!(deposit = %path, %amount, error = %e, "Deposit approved but balance was not credited");
            return Err(e.into());
        }

        let notified = self
            .notify(&claimed.user_id, NotificationKind::Success, &messages::deposit_approved(amount))
            .await;
        info!(deposit = %path, %amount, "Deposit approved");
        Ok(Resolution {
            path,
            user_id: claimed.user_id,
            credited: amount,
            notified,
        })
    }

    /// Pending → Failed. The balance is untouched.
    #[tracing::instrument(name = "deposits.reject", skip_all, fields(deposit = %txn.path()))]
    pub async fn reject(&self, txn: &Transaction) -> Result<Resolution> {
        let path = txn.path();
        let claimed = self.claim(txn, RequestStatus::Failed).await?;

        let notified = self
            .notify(
                &claimed.user_id,
                NotificationKind::Failed,
                &messages::deposit_rejected(claimed.amount),
            )
            .await;
        info!(deposit = %path, amount = %claimed.amount, "Deposit rejected");
        Ok(Resolution {
            path,
            user_id: claimed.user_id,
            credited: Decimal::ZERO,
            notified,
        })
    }

    pub async fn delete(&self, txn: &Transaction) -> Result<()> {
        let path = txn.path();
        self.store.remove(&path).await?;
        info!(deposit = %path, "Deposit record deleted");
        Ok(())
    }

    async fn claim(&self, txn: &Transaction, status: RequestStatus) -> Result<Transaction> {
        if txn.user_id.is_empty() || txn.key.is_empty() {
            return Err(ServiceError::InvalidInput(
                "deposit is missing its owner or key".to_string(),
            ));
        }
        let path = txn.path();
        if txn.is_ad_reward() {
            return Err(ServiceError::NotADeposit(path));
        }

        let mut ad_reward = false;
        let doc = claim(self.store.as_ref(), &path, Claim::Resolve(status), |doc| {
            let stored: Transaction =
                serde_json::from_value(Value::Object(doc.clone())).unwrap_or_default();
            ad_reward = stored.is_ad_reward();
            !ad_reward
        })
        .await;

        let doc = match doc {
            Ok(doc) => doc,
            Err(ServiceError::NotDue(_)) if ad_reward => return Err(ServiceError::NotADeposit(path)),
            Err(e) => return Err(e),
        };

        let mut claimed: Transaction = serde_json::from_value(Value::Object(doc))
            .map_err(|e| ServiceError::InvalidInput(format!("malformed deposit {path}: {e}")))?;
        claimed.key = txn.key.clone();
        claimed.user_id = txn.user_id.clone();
        Ok(claimed)
    }

    async fn notify(&self, uid: &str, kind: NotificationKind, text: &Localized) -> bool {
        match self.notifier.send_triggered(uid, kind, text).await {
            Ok(sent) => sent.is_some(),
            Err(e) => {
                warn!(user_id = %uid, error = %e, "Failed to send deposit notification");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests;
