//! Claiming a pending request before acting on it.
//!
//! Orders and deposits move out of `Pending` exactly once. The first
//! writer to flip the status (or delete the record) inside a store
//! transaction owns the resolution; everyone else sees `NotPending` and
//! must not touch the user's balance.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::error::{Result, ServiceError};
use crate::interfaces::{DocumentStore, TxnDecision};
use crate::models::RequestStatus;

/// What the winning claim writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Set the status to the given terminal state.
    Resolve(RequestStatus),
    /// Delete the record.
    Remove,
}

/// What a resolution did.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub path: String,
    pub user_id: String,
    /// Amount added to the user's balance (zero when the balance is untouched).
    pub credited: Decimal,
    /// Whether the user was notified.
    pub notified: bool,
}

fn status_of(doc: &Map<String, Value>) -> RequestStatus {
    doc.get("status")
        .cloned()
        .and_then(|s| serde_json::from_value(s).ok())
        .unwrap_or_default()
}

/// Claim the request at `path`. `guard` gets a final say on the
/// pending document (e.g. "still past its deadline").
///
/// Returns the document as it was when claimed.
pub async fn claim<G>(
    store: &dyn DocumentStore,
    path: &str,
    action: Claim,
    mut guard: G,
) -> Result<Map<String, Value>>
where
    G: FnMut(&Map<String, Value>) -> bool + Send,
{
    let mut claimed: Option<Map<String, Value>> = None;
    let mut observed = RequestStatus::Unknown;
    let mut refused = false;

    let outcome = store
        .transaction(path, &mut |current: Option<&Value>| {
            claimed = None;
            refused = false;
            let Some(Value::Object(doc)) = current else {
                observed = RequestStatus::Unknown;
                return TxnDecision::Abort;
            };
            observed = status_of(doc);
            if observed != RequestStatus::Pending {
                return TxnDecision::Abort;
            }
            if !guard(doc) {
                refused = true;
                return TxnDecision::Abort;
            }
            claimed = Some(doc.clone());
            match action {
                Claim::Resolve(status) => {
                    let mut next = doc.clone();
                    next.insert("status".to_string(), Value::String(status.as_str().to_string()));
                    TxnDecision::Commit(Some(Value::Object(next)))
                }
                Claim::Remove => TxnDecision::Commit(None),
            }
        })
        .await?;

    match claimed {
        Some(doc) if outcome.committed => Ok(doc),
        _ if outcome.value.is_none() => Err(ServiceError::NotFound(path.to_string())),
        _ if refused => Err(ServiceError::NotDue(path.to_string())),
        _ => Err(ServiceError::NotPending {
            path: path.to_string(),
            status: observed,
        }),
    }
}
