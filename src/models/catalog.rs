//! Storefront catalog kept under `config/`: offers, banners, payment
//! methods, support contacts and FAQs.
//!
//! The console rewrites these lists whole, so entries are decoded
//! permissively and re-encoded without losing fields the console does
//! not know about.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfferKind {
    Diamond,
    LevelUp,
    Membership,
    Premium,
    Special,
}

impl OfferKind {
    pub const ALL: [OfferKind; 5] = [
        OfferKind::Diamond,
        OfferKind::LevelUp,
        OfferKind::Membership,
        OfferKind::Premium,
        OfferKind::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferKind::Diamond => "diamond",
            OfferKind::LevelUp => "levelUp",
            OfferKind::Membership => "membership",
            OfferKind::Premium => "premium",
            OfferKind::Special => "special",
        }
    }
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OfferKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown offer kind: {s}"))
    }
}

/// One purchasable offer.
///
/// Diamond packs, level-up packages, memberships, premium apps and special
/// offers share this shape; kind-specific fields ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Creation time in epoch milliseconds; `0` means "not yet assigned".
    #[serde(default, deserialize_with = "lenient::count")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "is_zero")]
    pub diamonds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub action_url: String,
}

impl Banner {
    /// Banners were once stored as bare image URLs.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) => Some(Banner {
                image_url: url.clone(),
                ..Banner::default()
            }),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub account_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Contact type written for admin-created contacts.
pub const CUSTOM_CONTACT_TYPE: &str = "custom";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportContact {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub label_key: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_bn: Option<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_bn: Option<String>,
}

/// Items of a stored list node, which may be an array or (after sparse
/// writes) an object keyed by index.
pub fn list_items(node: Option<Value>) -> Vec<Value> {
    match node {
        Some(Value::Array(items)) => items.into_iter().filter(|v| !v.is_null()).collect(),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| crate::storage::query::compare_keys(a, b));
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}
