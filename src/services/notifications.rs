//! Notification emitter.
//!
//! Trigger notifications (order and deposit outcomes, auto-refunds,
//! balance changes) are targeted at one user and flagged `isAuto`.
//! Admin broadcasts go to everyone, or fan out to one copy per selected
//! user.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use super::error::Result;
use super::settings_sync::SettingsWatch;
use crate::interfaces::{DocumentStore, DocumentStoreExt, Query};
use crate::models::{paths, Localized, Notification, NotificationKind};
use crate::utils::time::Clock;

/// Composed by an admin in the console.
#[derive(Debug, Clone, Default)]
pub struct NotificationDraft {
    pub text: Localized,
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
    settings: SettingsWatch,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SettingsWatch, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            settings,
            clock,
        }
    }

    /// Send an automatic notification to one user.
    ///
    /// Returns `None` when automatic notifications are switched off; admin
    /// notifications are always sent. Returns the new notification id
    /// otherwise.
    pub async fn send_triggered(
        &self,
        target_uid: &str,
        kind: NotificationKind,
        text: &Localized,
    ) -> Result<Option<String>> {
        let enabled = self.settings.borrow().auto_notif_active;
        if !enabled && kind != NotificationKind::Admin {
            debug!(user_id = %target_uid, ?kind, "Automatic notifications disabled, skipping");
            return Ok(None);
        }

        let mut notification = Notification::from_localized(text, kind, self.clock.now_millis());
        notification.target_uid = Some(target_uid.to_string());
        notification.is_auto = true;

        let id = self.store.push_as(paths::NOTIFICATIONS, &notification).await?;
        debug!(user_id = %target_uid, notification = %id, "Trigger notification sent");
        Ok(Some(id))
    }

    /// Send an admin notification.
    ///
    /// With no recipients one untargeted notification is written; otherwise
    /// one copy per recipient. Returns the ids written.
    pub async fn broadcast(
        &self,
        draft: &NotificationDraft,
        recipients: &[String],
    ) -> Result<Vec<String>> {
        let base = Notification::from_localized(
            &draft.text,
            NotificationKind::Admin,
            self.clock.now_millis(),
        );

        if recipients.is_empty() {
            let id = self.store.push_as(paths::NOTIFICATIONS, &base).await?;
            info!(notification = %id, "Broadcast sent to all users");
            return Ok(vec![id]);
        }

        let writes = recipients.iter().map(|uid| {
            let mut targeted = base.clone();
            targeted.target_uid = Some(uid.clone());
            let store = Arc::clone(&self.store);
            async move { store.push_as(paths::NOTIFICATIONS, &targeted).await }
        });
        let ids = try_join_all(writes).await?;
        info!(recipients = ids.len(), "Broadcast fanned out to selected users");
        Ok(ids)
    }

    /// Notifications composed by admins, newest first.
    pub async fn list_admin(&self) -> Result<Vec<Notification>> {
        let records = self
            .store
            .query(paths::NOTIFICATIONS, &Query::children())
            .await?;
        let mut list: Vec<Notification> = records
            .iter()
            .filter_map(Notification::from_record)
            .filter(|n| !n.is_auto)
            .collect();
        list.reverse();
        Ok(list)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.remove(&paths::notification(id)).await?;
        info!(notification = %id, "Notification deleted");
        Ok(())
    }
}
