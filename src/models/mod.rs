//! Documents stored by the app and the back office.

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod deposit;
pub mod lenient;
pub mod notification;
pub mod order;
pub mod paths;
pub mod settings;
pub mod user;

pub use catalog::{Banner, FaqItem, Offer, OfferKind, PaymentMethod, SupportContact};
pub use deposit::{Transaction, TransactionKind};
pub use notification::{Localized, Message, Notification, NotificationKind};
pub use order::{OrderedOffer, Order};
pub use settings::{AppSettings, SettingsError};
pub use user::{GamerLevels, User};

/// Lifecycle of an order or deposit request.
///
/// `Pending` resolves exactly once, to `Completed` or `Failed` (orders may
/// also be deleted with a refund on expiry). Unrecognised values decode as
/// `Unknown` and are never treated as pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Completed => "Completed",
            RequestStatus::Failed => "Failed",
            RequestStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
