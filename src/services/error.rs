use crate::interfaces::StoreError;
use crate::ledger::LedgerError;
use crate::models::{RequestStatus, SettingsError};

/// Result type for admin actions.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur during admin actions.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Another resolution (manual or automatic) got there first.
    #[error("{path} is no longer pending (status: {status})")]
    NotPending { path: String, status: RequestStatus },

    #[error("Order {0} has not reached its auto-refund deadline")]
    NotDue(String),

    #[error("{0} is an ad reward, not a deposit")]
    NotADeposit(String),

    #[error("Index {index} is out of range for a list of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
