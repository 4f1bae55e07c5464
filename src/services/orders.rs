//! Order resolution: approve, reject, expire (auto-refund), delete.
//!
//! Each resolution claims the order first (see [`super::claim`]), then
//! applies the balance effect, then notifies the user. A ledger failure
//! after a successful claim is returned to the caller and logged as an
//! error; a notification failure is logged and reported in the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::claim::{claim, Claim, Resolution};
use super::error::{Result, ServiceError};
use super::messages;
use super::notifications::NotificationService;
use crate::expiry::ExpiryScheduler;
use crate::interfaces::DocumentStore;
use crate::ledger::Ledger;
use crate::models::{Localized, NotificationKind, Order, RequestStatus};
use crate::utils::time::{parse_timestamp, Clock};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
    ledger: Ledger,
    notifier: NotificationService,
    scheduler: Arc<ExpiryScheduler>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ledger: Ledger,
        notifier: NotificationService,
        scheduler: Arc<ExpiryScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            scheduler,
            clock,
        }
    }

    /// Pending → Completed. Balance is untouched (it was charged when the
    /// order was placed); spend counters grow by the price.
    #[tracing::instrument(name = "orders.approve", skip_all, fields(order = %order.path()))]
    pub async fn approve(&self, order: &Order) -> Result<Resolution> {
        let path = order.path();
        let claimed = self
            .claim(order, Claim::Resolve(RequestStatus::Completed), |_| true)
            .await?;

        let price = claimed.charge();
        if let Err(e) = self
            .ledger
            .record_purchase(&claimed.user_id, price, self.clock.now())
            .await
        {
            error!(order = %path, error = %e, "Order completed but spend counters were not updated");
            return Err(e.into());
        }

        let notified = self
            .notify(
                &claimed.user_id,
                NotificationKind::Success,
                &messages::order_completed(&claimed.label()),
            )
            .await;
        info!(order = %path, %price, "Order approved");
        Ok(Resolution {
            path,
            user_id: claimed.user_id,
            credited: Decimal::ZERO,
            notified,
        })
    }

    /// Pending → Failed, refunding the price exactly once.
    #[tracing::instrument(name = "orders.reject", skip_all, fields(order = %order.path()))]
    pub async fn reject(&self, order: &Order) -> Result<Resolution> {
        let path = order.path();
        let claimed = self
            .claim(order, Claim::Resolve(RequestStatus::Failed), |_| true)
            .await?;

        let price = claimed.charge();
        if let Err(e) = self.ledger.adjust(&claimed.user_id, price).await {
            error!(order = %path, %price, error = %e, "Order rejected but refund failed");
            return Err(e.into());
        }

        let notified = self
            .notify(
                &claimed.user_id,
                NotificationKind::Failed,
                &messages::order_rejected(&claimed.label()),
            )
            .await;
        info!(order = %path, refunded = %price, "Order rejected");
        Ok(Resolution {
            path,
            user_id: claimed.user_id,
            credited: price,
            notified,
        })
    }

    /// Auto-refund a Pending order that has waited at least `timeout`.
    ///
    /// The order record is deleted and its price credited back. Fails with
    /// [`ServiceError::NotDue`] if the stored order is younger than
    /// `timeout` at `now`.
    #[tracing::instrument(name = "orders.expire", skip_all, fields(order = %order.path()))]
    pub async fn expire(
        &self,
        order: &Order,
        now: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> Result<Resolution> {
        let path = order.path();
        let claimed = self
            .claim(order, Claim::Remove, |doc| {
                doc.get("date")
                    .and_then(parse_timestamp)
                    .is_some_and(|placed| now - placed >= timeout)
            })
            .await?;

        let price = claimed.charge();
        if let Err(e) = self.ledger.adjust(&claimed.user_id, price).await {
            error!(order = %path, %price, error = %e, "Expired order deleted but refund failed");
            return Err(e.into());
        }

        let minutes = u32::try_from(timeout.num_minutes()).unwrap_or(u32::MAX);
        let notified = self
            .notify(
                &claimed.user_id,
                NotificationKind::Failed,
                &messages::order_auto_refunded(&claimed.id, price, minutes),
            )
            .await;
        info!(order = %path, refunded = %price, "Order auto-refunded");
        Ok(Resolution {
            path,
            user_id: claimed.user_id,
            credited: price,
            notified,
        })
    }

    /// Remove an order record regardless of status. No balance effect.
    pub async fn delete(&self, order: &Order) -> Result<()> {
        let path = order.path();
        self.scheduler.cancel(&path);
        self.store.remove(&path).await?;
        info!(order = %path, "Order record deleted");
        Ok(())
    }

    async fn claim<G>(&self, order: &Order, action: Claim, guard: G) -> Result<Order>
    where
        G: FnMut(&Map<String, Value>) -> bool + Send,
    {
        if order.user_id.is_empty() || order.key.is_empty() {
            return Err(ServiceError::InvalidInput(
                "order is missing its owner or key".to_string(),
            ));
        }
        let path = order.path();
        let doc = match claim(self.store.as_ref(), &path, action, guard).await {
            Ok(doc) => doc,
            Err(e @ (ServiceError::NotPending { .. } | ServiceError::NotFound(_))) => {
                // Someone else resolved it; nothing left to schedule.
                self.scheduler.cancel(&path);
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.scheduler.cancel(&path);

        let mut claimed: Order = serde_json::from_value(Value::Object(doc))
            .map_err(|e| ServiceError::InvalidInput(format!("malformed order {path}: {e}")))?;
        claimed.key = order.key.clone();
        claimed.user_id = order.user_id.clone();
        Ok(claimed)
    }

    async fn notify(&self, uid: &str, kind: NotificationKind, text: &Localized) -> bool {
        match self.notifier.send_triggered(uid, kind, text).await {
            Ok(sent) => sent.is_some(),
            Err(e) => {
                warn!(user_id = %uid, error = %e, "Failed to send order notification");
                false
            }
        }
    }
}
