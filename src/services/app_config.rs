//! Console writes to `config/`: app settings, offers and the storefront
//! lists.
//!
//! Lists are stored as arrays and always rewritten whole.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::{Result, ServiceError};
use super::settings_sync;
use crate::interfaces::DocumentStore;
use crate::models::catalog::{list_items, CUSTOM_CONTACT_TYPE};
use crate::models::settings::{DeveloperSettings, PopupConfig};
use crate::models::{
    paths, AppSettings, Banner, FaqItem, Offer, OfferKind, PaymentMethod, SupportContact,
};
use crate::utils::time::Clock;

const DEVELOPER_SETTINGS_FIELD: &str = "developerSettings";

/// Optional fields of the settings form. Unset values are left out when
/// serialized, so they are written as null (removal) explicitly. The logo
/// and popup have their own forms and are not touched here.
const CLEARABLE_SETTINGS_FIELDS: &[&str] = &[
    "aiName",
    "notice",
    "contactMessage",
    "operatingHours",
    "walletVideoUrl",
];

/// What the support screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportInfo {
    pub contacts: Vec<SupportContact>,
    pub faqs: Vec<FaqItem>,
    pub operating_hours: Option<String>,
    pub contact_message: Option<String>,
}

#[derive(Clone)]
pub struct AppConfigService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl AppConfigService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // -- settings --

    pub async fn settings(&self) -> Result<AppSettings> {
        settings_sync::load(self.store.as_ref()).await
    }

    /// Validate and save the settings form.
    ///
    /// The API key and AdMob ids are trimmed first. Developer settings are
    /// never written from here; they have their own locked form.
    #[tracing::instrument(name = "config.save_settings", skip_all)]
    pub async fn save_settings(&self, settings: &AppSettings) -> Result<AppSettings> {
        let mut saved = settings.clone();
        saved.normalize()?;

        let mut patch = to_value(&saved)?;
        if let Value::Object(fields) = &mut patch {
            fields.remove(DEVELOPER_SETTINGS_FIELD);
            for field in CLEARABLE_SETTINGS_FIELDS {
                fields.entry(field.to_string()).or_insert(Value::Null);
            }
        }
        self.store.update(paths::APP_SETTINGS, patch).await?;
        info!("App settings saved");
        Ok(saved)
    }

    pub async fn save_developer_settings(&self, developer: &DeveloperSettings) -> Result<()> {
        self.store
            .update(paths::DEVELOPER_SETTINGS, to_value(developer)?)
            .await?;
        info!("Developer settings saved");
        Ok(())
    }

    pub async fn save_popup(&self, popup: &PopupConfig) -> Result<()> {
        self.store
            .update(paths::APP_SETTINGS, json!({ "popupNotification": to_value(popup)? }))
            .await?;
        Ok(())
    }

    pub async fn update_logo(&self, logo_url: &str) -> Result<()> {
        let url = logo_url.trim();
        if url.is_empty() {
            return Err(ServiceError::InvalidInput("logo URL is empty".to_string()));
        }
        self.store
            .update(paths::APP_SETTINGS, json!({ "logoUrl": url }))
            .await?;
        Ok(())
    }

    // -- offers --

    pub async fn offers(&self, kind: OfferKind) -> Result<Vec<Offer>> {
        self.read_list(&paths::offers(kind)).await
    }

    /// Insert or replace an offer (matched by id). Returns the saved offer.
    ///
    /// New offers get the current time in milliseconds as id. Unnamed
    /// diamond packs are named after their diamond count; special offers
    /// start active.
    #[tracing::instrument(name = "config.upsert_offer", skip_all, fields(%kind))]
    pub async fn upsert_offer(&self, kind: OfferKind, offer: Offer) -> Result<Offer> {
        let mut offer = offer;
        let existing_id = offer.id;
        if offer.id == 0 {
            offer.id = u64::try_from(self.clock.now_millis()).unwrap_or_default();
        }
        if kind == OfferKind::Diamond && offer.name.as_deref().is_none_or(str::is_empty) {
            offer.name = Some(format!("{} Diamonds", offer.diamonds));
        }
        if kind == OfferKind::Special && offer.is_active.is_none() {
            offer.is_active = Some(true);
        }

        let mut list = self.offers(kind).await?;
        match list.iter_mut().find(|o| existing_id != 0 && o.id == existing_id) {
            Some(slot) => *slot = offer.clone(),
            None => list.push(offer.clone()),
        }
        self.write_list(&paths::offers(kind), &list).await?;
        info!(offer = offer.id, "Offer saved");
        Ok(offer)
    }

    /// Remove an offer by id. Returns false if no offer had that id.
    pub async fn delete_offer(&self, kind: OfferKind, id: u64) -> Result<bool> {
        let mut list = self.offers(kind).await?;
        let before = list.len();
        list.retain(|o| o.id != id);
        if list.len() == before {
            return Ok(false);
        }
        self.write_list(&paths::offers(kind), &list).await?;
        Ok(true)
    }

    /// Reorder offers cheapest first. Equal prices keep their order.
    pub async fn sort_offers_by_price(&self, kind: OfferKind) -> Result<Vec<Offer>> {
        let mut list = self.offers(kind).await?;
        list.sort_by(|a, b| a.price.cmp(&b.price));
        self.write_list(&paths::offers(kind), &list).await?;
        Ok(list)
    }

    /// Move the offer at `from` so it ends up at `to`.
    pub async fn move_offer(&self, kind: OfferKind, from: usize, to: usize) -> Result<Vec<Offer>> {
        let mut list = self.offers(kind).await?;
        let len = list.len();
        for index in [from, to] {
            if index >= len {
                return Err(ServiceError::IndexOutOfRange { index, len });
            }
        }
        let item = list.remove(from);
        list.insert(to, item);
        self.write_list(&paths::offers(kind), &list).await?;
        Ok(list)
    }

    // -- storefront lists --

    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        self.read_list(paths::PAYMENT_METHODS).await
    }

    pub async fn save_payment_method(&self, index: Option<usize>, method: PaymentMethod) -> Result<()> {
        let mut list = self.payment_methods().await?;
        place(&mut list, index, method)?;
        self.write_list(paths::PAYMENT_METHODS, &list).await
    }

    pub async fn delete_payment_method(&self, index: usize) -> Result<()> {
        let mut list = self.payment_methods().await?;
        take(&mut list, index)?;
        self.write_list(paths::PAYMENT_METHODS, &list).await
    }

    pub async fn support_contacts(&self) -> Result<Vec<SupportContact>> {
        self.read_list(paths::SUPPORT_CONTACTS).await
    }

    /// Contacts created in the console are `custom` and labelled by title.
    pub async fn save_support_contact(
        &self,
        index: Option<usize>,
        contact: SupportContact,
    ) -> Result<()> {
        let mut contact = contact;
        contact.label_key = contact.title.clone().unwrap_or_default();
        contact.kind = CUSTOM_CONTACT_TYPE.to_string();

        let mut list = self.support_contacts().await?;
        place(&mut list, index, contact)?;
        self.write_list(paths::SUPPORT_CONTACTS, &list).await
    }

    pub async fn delete_support_contact(&self, index: usize) -> Result<()> {
        let mut list = self.support_contacts().await?;
        take(&mut list, index)?;
        self.write_list(paths::SUPPORT_CONTACTS, &list).await
    }

    pub async fn banners(&self) -> Result<Vec<Banner>> {
        let node = self.store.get(paths::BANNERS).await?;
        Ok(list_items(node).iter().filter_map(Banner::from_value).collect())
    }

    pub async fn save_banner(&self, index: Option<usize>, banner: Banner) -> Result<()> {
        if banner.image_url.trim().is_empty() {
            return Err(ServiceError::InvalidInput("banner image URL is empty".to_string()));
        }
        let mut list = self.banners().await?;
        place(&mut list, index, banner)?;
        self.write_list(paths::BANNERS, &list).await
    }

    pub async fn delete_banner(&self, index: usize) -> Result<()> {
        let mut list = self.banners().await?;
        take(&mut list, index)?;
        self.write_list(paths::BANNERS, &list).await
    }

    pub async fn faqs(&self) -> Result<Vec<FaqItem>> {
        self.read_list(paths::FAQS).await
    }

    /// Insert or replace a FAQ by id. Returns the id.
    pub async fn save_faq(&self, faq: FaqItem) -> Result<String> {
        let mut faq = faq;
        if faq.id.is_empty() {
            faq.id = self.clock.now_millis().to_string();
        }
        let mut list = self.faqs().await?;
        match list.iter_mut().find(|f| f.id == faq.id) {
            Some(slot) => *slot = faq.clone(),
            None => list.push(faq.clone()),
        }
        self.write_list(paths::FAQS, &list).await?;
        Ok(faq.id)
    }

    /// Delete a FAQ by id. Deleting the last one removes the node.
    pub async fn delete_faq(&self, id: &str) -> Result<bool> {
        let mut list = self.faqs().await?;
        let before = list.len();
        list.retain(|f| f.id != id);
        if list.len() == before {
            return Ok(false);
        }
        if list.is_empty() {
            self.store.remove(paths::FAQS).await?;
        } else {
            self.write_list(paths::FAQS, &list).await?;
        }
        Ok(true)
    }

    pub async fn support_info(&self) -> Result<SupportInfo> {
        let settings = self.settings().await?;
        Ok(SupportInfo {
            contacts: self.support_contacts().await?,
            faqs: self.faqs().await?,
            operating_hours: settings.operating_hours,
            contact_message: settings.contact_message,
        })
    }

    async fn read_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let node = self.store.get(path).await?;
        Ok(list_items(node)
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }

    async fn write_list<T: Serialize>(&self, path: &str, items: &[T]) -> Result<()> {
        self.store.set(path, to_value(items)?).await?;
        Ok(())
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| crate::interfaces::StoreError::from(e).into())
}

/// Replace the item at `index`, or append when `index` is `None`.
fn place<T>(list: &mut Vec<T>, index: Option<usize>, item: T) -> Result<()> {
    match index {
        None => list.push(item),
        Some(index) => {
            let len = list.len();
            let slot = list
                .get_mut(index)
                .ok_or(ServiceError::IndexOutOfRange { index, len })?;
            *slot = item;
        }
    }
    Ok(())
}

fn take<T>(list: &mut Vec<T>, index: usize) -> Result<T> {
    if index >= list.len() {
        return Err(ServiceError::IndexOutOfRange {
            index,
            len: list.len(),
        });
    }
    Ok(list.remove(index))
}

#[cfg(test)]
mod tests;
