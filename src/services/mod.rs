//! Admin actions over the document store.

pub mod app_config;
pub mod claim;
pub mod deposits;
pub mod error;
pub mod messages;
pub mod notifications;
pub mod orders;
pub mod settings_sync;
pub mod users;

#[cfg(test)]
pub(crate) mod fixtures;

pub use app_config::{AppConfigService, SupportInfo};
pub use claim::{Claim, Resolution};
pub use deposits::DepositService;
pub use error::{Result, ServiceError};
pub use notifications::{NotificationDraft, NotificationService};
pub use orders::OrderService;
pub use settings_sync::SettingsWatch;
pub use users::UserService;
