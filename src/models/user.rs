//! User documents (`users/{uid}`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::interfaces::Record;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GamerLevels {
    #[serde(deserialize_with = "lenient::small_count")]
    pub unlocked: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub points: u64,
}

/// A user account as seen by the back office.
///
/// Balances and counters are only ever written through
/// [`crate::ledger`]; this type is the read side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Record key; not part of the stored body.
    #[serde(skip)]
    pub uid: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub email: String,
    /// In-game player id.
    #[serde(deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub player_uid: Option<String>,
    #[serde(deserialize_with = "lenient::decimal")]
    pub balance: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub total_earned: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub total_spent: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub total_deposit: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub monthly_spent: Decimal,
    #[serde(deserialize_with = "lenient::decimal")]
    pub monthly_earned: Decimal,
    /// `YYYY-MM` of the month the monthly counters belong to.
    #[serde(deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub last_month_update: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub total_ads_watched: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub ai_request_count: u64,
    #[serde(deserialize_with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub last_ai_interaction: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamer_levels: Option<GamerLevels>,
    #[serde(deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_banned: bool,
    #[serde(deserialize_with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Decode a `users` record, taking the uid from its key.
    pub fn from_record(record: &Record) -> Option<Self> {
        let mut user: User = record.decode()?;
        user.uid = record.key.clone();
        Some(user)
    }

    pub fn unlocked_level(&self) -> u32 {
        self.gamer_levels.as_ref().map_or(0, |g| g.unlocked)
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    /// Monthly spend, or zero when the counters belong to another month.
    pub fn monthly_spent_in(&self, month: &str) -> Decimal {
        if self.last_month_update.as_deref() == Some(month) {
            self.monthly_spent
        } else {
            Decimal::ZERO
        }
    }

    /// Monthly earnings, or zero when the counters belong to another month.
    pub fn monthly_earned_in(&self, month: &str) -> Decimal {
        if self.last_month_update.as_deref() == Some(month) {
            self.monthly_earned
        } else {
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_coerces_garbage_to_zero() {
        let record = Record {
            parent: None,
            key: "u1".to_string(),
            value: json!({
                "name": "Nila",
                "balance": "250",
                "totalSpent": null,
                "aiRequestCount": "x",
                "gamerLevels": {"unlocked": 12},
                "playerUid": 123456,
            }),
        };
        let user = User::from_record(&record).unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.balance, Decimal::from(250));
        assert_eq!(user.total_spent, Decimal::ZERO);
        assert_eq!(user.ai_request_count, 0);
        assert_eq!(user.unlocked_level(), 12);
        assert_eq!(user.player_uid.as_deref(), Some("123456"));
    }

    #[test]
    fn test_monthly_counters_scoped_to_month() {
        let user = User {
            monthly_spent: Decimal::from(90),
            last_month_update: Some("2024-04".to_string()),
            ..User::default()
        };
        assert_eq!(user.monthly_spent_in("2024-04"), Decimal::from(90));
        assert_eq!(user.monthly_spent_in("2024-05"), Decimal::ZERO);
    }
}
