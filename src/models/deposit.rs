//! Wallet transactions (`transactions/{userId}/{key}`): deposits and ad rewards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{lenient, paths, RequestStatus};
use crate::interfaces::Record;

/// Method label older clients wrote for ad rewards instead of a `type`.
pub const AD_WATCH_METHOD: &str = "Ad Watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    AdReward,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    /// Record key; not part of the stored body.
    #[serde(skip)]
    pub key: String,
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::text")]
    pub method: String,
    pub status: RequestStatus,
    #[serde(deserialize_with = "lenient::text")]
    pub user_id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Payment provider reference entered by the user.
    #[serde(deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl Transaction {
    /// Decode a transaction from a grandchild record of `transactions`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let mut txn: Transaction = record.decode()?;
        txn.key = record.key.clone();
        if let Some(parent) = &record.parent {
            txn.user_id = parent.clone();
        }
        Some(txn)
    }

    pub fn path(&self) -> String {
        paths::transaction(&self.user_id, &self.key)
    }

    /// Ad rewards share the collection but are not deposits.
    pub fn is_ad_reward(&self) -> bool {
        self.kind == Some(TransactionKind::AdReward) || self.method == AD_WATCH_METHOD
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Transaction {
        Transaction::from_record(&Record {
            parent: Some("u1".to_string()),
            key: "t1".to_string(),
            value,
        })
        .unwrap()
    }

    #[test]
    fn test_ad_reward_detection() {
        assert!(decode(json!({"type": "ad_reward", "amount": 2})).is_ad_reward());
        assert!(decode(json!({"method": "Ad Watch", "amount": 2})).is_ad_reward());
        assert!(!decode(json!({"type": "deposit", "method": "bKash"})).is_ad_reward());
        assert!(!decode(json!({"method": "Nagad"})).is_ad_reward());
    }

    #[test]
    fn test_decode_deposit() {
        let txn = decode(json!({
            "amount": 200,
            "method": "bKash",
            "status": "Pending",
            "transactionId": "8N7A6B",
            "date": "2024-05-01T10:00:00.000Z",
        }));
        assert_eq!(txn.path(), "transactions/u1/t1");
        assert_eq!(txn.amount, Decimal::from(200));
        assert!(txn.is_pending());
        assert_eq!(txn.transaction_id.as_deref(), Some("8N7A6B"));
    }
}
