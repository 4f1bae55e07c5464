//! App settings (`config/appSettings`).
//!
//! The document is edited by the console and read by every client, so it
//! is decoded into one explicitly defaulted structure: absent fields take
//! defaults, nested sections merge field-by-field over their defaults, and
//! fields this version does not know about are carried through unchanged.
//! Every load runs [`AppSettings::load`]: decode, upgrade from older
//! schema versions, validate.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Schema version written by this release.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
/// Minutes a Pending order may wait before it is auto-refunded.
pub const DEFAULT_AUTO_REFUND_MINUTES: u32 = 30;
/// Longest auto-refund window the console accepts (one week).
pub const MAX_AUTO_REFUND_MINUTES: u32 = 7 * 24 * 60;

static API_KEY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^AIza[0-9A-Za-z\-_]{35}$").ok());

/// Errors from decoding or validating app settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid API Key format.")]
    InvalidApiKey,

    #[error("Auto-refund window must be between 1 and {MAX_AUTO_REFUND_MINUTES} minutes, got {0}")]
    InvalidRefundWindow(u32),

    #[error("Reward per ad cannot be negative: {0}")]
    NegativeReward(Decimal),

    #[error("Settings schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Malformed settings document: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppVisibility {
    pub diamonds: bool,
    pub level_up: bool,
    pub membership: bool,
    pub premium: bool,
    pub earn: bool,
    pub ranking: bool,
    pub special_offers: bool,
}

impl Default for AppVisibility {
    fn default() -> Self {
        Self {
            diamonds: true,
            level_up: true,
            membership: true,
            premium: true,
            earn: true,
            ranking: true,
            special_offers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebAds {
    pub active: bool,
    pub url: String,
    /// Seconds an ad page must stay open.
    #[serde(deserialize_with = "lenient::small_count")]
    pub duration: u32,
}

impl Default for WebAds {
    fn default() -> Self {
        Self {
            active: false,
            url: String::new(),
            duration: 15,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdMob {
    pub active: bool,
    pub app_id: String,
    pub reward_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interstitial_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EarnSettings {
    #[serde(deserialize_with = "lenient::small_count")]
    pub daily_limit: u32,
    #[serde(deserialize_with = "lenient::decimal")]
    pub reward_per_ad: Decimal,
    #[serde(deserialize_with = "lenient::small_count")]
    pub ad_cooldown_seconds: u32,
    #[serde(deserialize_with = "lenient::small_count")]
    pub reset_hours: u32,
    pub vpn_required: bool,
    pub vpn_notice_active: bool,
    pub web_ads: WebAds,
    pub ad_mob: AdMob,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_ad_code: Option<String>,
    pub home_ad_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earn_ad_code: Option<String>,
    pub earn_ad_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_ad_code: Option<String>,
    pub profile_ad_active: bool,
}

impl Default for EarnSettings {
    fn default() -> Self {
        Self {
            daily_limit: 10,
            reward_per_ad: Decimal::ONE,
            ad_cooldown_seconds: 30,
            reset_hours: 24,
            vpn_required: false,
            vpn_notice_active: false,
            web_ads: WebAds::default(),
            ad_mob: AdMob::default(),
            home_ad_code: None,
            home_ad_active: false,
            earn_ad_code: None,
            earn_ad_active: false,
            profile_ad_code: None,
            profile_ad_active: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardSize {
    #[default]
    Normal,
    Small,
    Smaller,
    ExtraSmall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSettings {
    pub card_size: CardSize,
    pub animations_enabled: bool,
    pub show_card_border: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            card_size: CardSize::Normal,
            animations_enabled: true,
            show_card_border: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeveloperSettings {
    pub title: String,
    pub url: String,
    pub message: String,
    pub description: String,
}

/// Popup shown to users on app start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopupConfig {
    pub active: bool,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            active: false,
            title: "Welcome".to_string(),
            message: "Welcome to our app!".to_string(),
            image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Absent on documents written before versioning (read as 0).
    #[serde(default)]
    pub schema_version: u32,
    pub app_name: String,
    pub maintenance_mode: bool,
    pub header_logo_active: bool,
    pub login_app_name_active: bool,
    pub ai_support_active: bool,
    pub ai_api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    pub visibility: AppVisibility,
    pub earn_settings: EarnSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_settings: Option<DeveloperSettings>,
    pub ui_settings: UiSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup_notification: Option<PopupConfig>,
    pub wallet_video_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_video_url: Option<String>,
    pub wallet_spacing_active: bool,
    /// Whether order/deposit outcomes notify the user automatically.
    pub auto_notif_active: bool,
    pub is_quiz_enabled: bool,
    pub auto_refund_active: bool,
    #[serde(deserialize_with = "lenient::small_count")]
    pub auto_refund_minutes: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            app_name: "Top Up".to_string(),
            maintenance_mode: false,
            header_logo_active: true,
            login_app_name_active: true,
            ai_support_active: false,
            ai_api_key: String::new(),
            ai_name: None,
            notice: None,
            logo_url: None,
            contact_message: None,
            operating_hours: None,
            visibility: AppVisibility::default(),
            earn_settings: EarnSettings::default(),
            developer_settings: None,
            ui_settings: UiSettings::default(),
            popup_notification: None,
            wallet_video_active: false,
            wallet_video_url: None,
            wallet_spacing_active: false,
            auto_notif_active: true,
            is_quiz_enabled: false,
            auto_refund_active: true,
            auto_refund_minutes: DEFAULT_AUTO_REFUND_MINUTES,
            extra: Map::new(),
        }
    }
}

impl AppSettings {
    /// Decode, upgrade and validate a stored settings document.
    ///
    /// A missing document yields the defaults.
    pub fn load(value: Option<Value>) -> Result<Self, SettingsError> {
        let Some(value) = value else {
            return Ok(Self::default());
        };
        let mut settings: AppSettings = serde_json::from_value(value)?;
        settings.upgrade()?;
        settings.validate()?;
        Ok(settings)
    }

    fn upgrade(&mut self) -> Result<(), SettingsError> {
        if self.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: self.schema_version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if self.schema_version == 0 {
            // Unversioned documents used 0 (or nothing) for "default window".
            if self.auto_refund_minutes == 0 {
                self.auto_refund_minutes = DEFAULT_AUTO_REFUND_MINUTES;
            }
            self.schema_version = CURRENT_SCHEMA_VERSION;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let key = self.ai_api_key.trim();
        if !key.is_empty() && !is_valid_api_key(key) {
            return Err(SettingsError::InvalidApiKey);
        }
        if self.auto_refund_minutes == 0 || self.auto_refund_minutes > MAX_AUTO_REFUND_MINUTES {
            return Err(SettingsError::InvalidRefundWindow(self.auto_refund_minutes));
        }
        if self.earn_settings.reward_per_ad.is_sign_negative() {
            return Err(SettingsError::NegativeReward(self.earn_settings.reward_per_ad));
        }
        Ok(())
    }

    /// Trim admin-entered identifiers, then validate.
    pub fn normalize(&mut self) -> Result<(), SettingsError> {
        self.ai_api_key = self.ai_api_key.trim().to_string();
        let ad_mob = &mut self.earn_settings.ad_mob;
        ad_mob.app_id = ad_mob.app_id.trim().to_string();
        ad_mob.reward_id = ad_mob.reward_id.trim().to_string();
        self.schema_version = CURRENT_SCHEMA_VERSION;
        self.validate()
    }

    /// The auto-refund window as a duration.
    pub fn auto_refund_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.auto_refund_minutes))
    }

    /// Popup config, falling back to the default popup.
    pub fn popup(&self) -> PopupConfig {
        self.popup_notification.clone().unwrap_or_default()
    }
}

pub fn is_valid_api_key(key: &str) -> bool {
    API_KEY_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(key))
}
