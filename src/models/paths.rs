//! Store layout.

pub const USERS: &str = "users";
pub const ORDERS: &str = "orders";
pub const TRANSACTIONS: &str = "transactions";
pub const NOTIFICATIONS: &str = "notifications";
pub const CONFIG: &str = "config";
pub const APP_SETTINGS: &str = "config/appSettings";
pub const DEVELOPER_SETTINGS: &str = "config/appSettings/developerSettings";
pub const BANNERS: &str = "config/banners";
pub const PAYMENT_METHODS: &str = "config/paymentMethods";
pub const SUPPORT_CONTACTS: &str = "config/supportContacts";
pub const FAQS: &str = "config/faqs";

pub fn user(uid: &str) -> String {
    format!("{USERS}/{uid}")
}

pub fn order(user_id: &str, key: &str) -> String {
    format!("{ORDERS}/{user_id}/{key}")
}

pub fn transaction(user_id: &str, key: &str) -> String {
    format!("{TRANSACTIONS}/{user_id}/{key}")
}

pub fn notification(id: &str) -> String {
    format!("{NOTIFICATIONS}/{id}")
}

pub fn offers(kind: super::catalog::OfferKind) -> String {
    format!("{CONFIG}/offers/{}", kind.as_str())
}
