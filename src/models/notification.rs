//! Notifications (`notifications/{id}`).

use serde::{Deserialize, Serialize};

use super::lenient;
use crate::interfaces::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failed,
    #[default]
    Admin,
    Bonus,
    Offer,
}

/// Title and body in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

impl Message {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A message in both app languages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Localized {
    pub en: Message,
    pub bn: Message,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    /// Record key; not part of the stored body.
    #[serde(skip)]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(rename = "title_bn", skip_serializing_if = "Option::is_none")]
    pub title_bn: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub message: String,
    #[serde(rename = "message_bn", skip_serializing_if = "Option::is_none")]
    pub message_bn: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Recipient; absent for broadcasts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_uid: Option<String>,
    /// Written by a system trigger rather than composed by an admin.
    #[serde(deserialize_with = "lenient::flag", skip_serializing_if = "std::ops::Not::not")]
    pub is_auto: bool,
}

impl Notification {
    pub fn from_localized(text: &Localized, kind: NotificationKind, timestamp: i64) -> Self {
        Self {
            id: String::new(),
            title: text.en.title.clone(),
            title_bn: Some(text.bn.title.clone()),
            message: text.en.body.clone(),
            message_bn: Some(text.bn.body.clone()),
            timestamp,
            kind,
            target_uid: None,
            is_auto: false,
        }
    }

    pub fn from_record(record: &Record) -> Option<Self> {
        let mut notification: Notification = record.decode()?;
        notification.id = record.key.clone();
        Some(notification)
    }
}
