//! Keeps an in-process copy of the app settings in step with the store.
//!
//! A listener on the `config` subtree decodes `appSettings` on every
//! change and publishes it on a watch channel. Documents that fail to
//! decode or validate are logged and the last good value stays in force.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::Result;
use crate::interfaces::{DocumentStore, Query, Record};
use crate::models::{paths, AppSettings};
use crate::utils::task::{stopped, TaskHandle};

/// Latest app settings.
pub type SettingsWatch = watch::Receiver<AppSettings>;

const APP_SETTINGS_KEY: &str = "appSettings";

/// A watch pinned to `settings`, for callers without a live store.
///
/// The sender is dropped, so `borrow` keeps returning `settings` and
/// `changed` reports the channel closed.
pub fn fixed(settings: AppSettings) -> SettingsWatch {
    let (_tx, rx) = watch::channel(settings);
    rx
}

/// Read and decode the stored settings once.
///
/// Invalid documents fall back to defaults.
pub async fn load(store: &dyn DocumentStore) -> Result<AppSettings> {
    let value = store.get(paths::APP_SETTINGS).await?;
    Ok(decode_or_default(value))
}

fn decode_or_default(value: Option<Value>) -> AppSettings {
    AppSettings::load(value).unwrap_or_else(|e| {
        warn!(error = %e, "Stored app settings are invalid, using defaults");
        AppSettings::default()
    })
}

fn settings_in(records: &[Record]) -> Option<Value> {
    records
        .iter()
        .find(|r| r.key == APP_SETTINGS_KEY)
        .map(|r| r.value.clone())
}

/// Start syncing. Returns the settings watch and the listener task.
pub async fn start(store: Arc<dyn DocumentStore>) -> Result<(SettingsWatch, TaskHandle)> {
    let initial = load(store.as_ref()).await?;
    let (tx, rx) = watch::channel(initial);
    let mut subscription = store.listen(paths::CONFIG, Query::children()).await?;

    let handle = TaskHandle::spawn("settings-sync", move |mut shutdown| async move {
        info!("Settings sync started");
        loop {
            let records = tokio::select! {
                _ = stopped(&mut shutdown) => break,
                next = subscription.next() => match next {
                    Some(records) => records,
                    None => {
                        warn!("Settings listener closed");
                        break;
                    }
                },
            };

            match AppSettings::load(settings_in(&records)) {
                Ok(settings) => {
                    tx.send_if_modified(|current| {
                        if *current == settings {
                            false
                        } else {
                            debug!("App settings changed");
                            *current = settings;
                            true
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Ignoring invalid app settings update"),
            }
        }
        info!("Settings sync stopped");
    });

    Ok((rx, handle))
}
