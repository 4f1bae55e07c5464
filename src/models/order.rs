//! Purchase orders (`orders/{userId}/{key}`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, paths, RequestStatus};
use crate::interfaces::Record;

/// The catalog item an order was placed for, as captured at order time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderedOffer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub diamonds: u64,
    #[serde(deserialize_with = "lenient::decimal")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    /// Record key; not part of the stored body.
    #[serde(skip)]
    pub key: String,
    /// Display id shown to the user.
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<OrderedOffer>,
    #[serde(deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub status: RequestStatus,
    /// Player id the top-up is delivered to.
    #[serde(deserialize_with = "lenient::text")]
    pub uid: String,
    /// Owning account; the parent key of the record.
    #[serde(deserialize_with = "lenient::text")]
    pub user_id: String,
}

impl Order {
    /// Decode an order from a grandchild record of `orders`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let mut order: Order = record.decode()?;
        order.key = record.key.clone();
        if let Some(parent) = &record.parent {
            order.user_id = parent.clone();
        }
        Some(order)
    }

    pub fn path(&self) -> String {
        paths::order(&self.user_id, &self.key)
    }

    /// Amount the user was charged: the offer price, else the order price.
    pub fn charge(&self) -> Decimal {
        self.offer
            .as_ref()
            .map(|o| o.price)
            .filter(|p| !p.is_zero())
            .unwrap_or(self.price)
    }

    /// What the user ordered, for notification text.
    pub fn label(&self) -> String {
        match &self.offer {
            Some(OrderedOffer { name: Some(name), .. }) => name.clone(),
            Some(offer) if offer.diamonds > 0 => offer.diamonds.to_string(),
            _ => self.id.clone(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Whether the order has waited at least `timeout` at `now`.
    ///
    /// Orders without a readable date are never considered expired.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.date.is_some_and(|placed| now - placed >= timeout)
    }
}
