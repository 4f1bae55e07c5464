//! Storage implementations.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::config::StoreConfig;
use crate::interfaces::{Result, StoreError};

pub mod memory;
pub mod query;
pub mod tree;

pub use memory::MemoryStore;

/// Initialize the store based on configuration.
///
/// The in-memory store starts empty unless `seed_path` names a database
/// export (`.json`, or `.yaml`/`.yml`).
pub async fn init_store(config: &StoreConfig) -> Result<MemoryStore> {
    let root = match &config.seed_path {
        Some(path) => {
            info!(path = %path, "Store: in-memory, seeded from export");
            load_seed(Path::new(path)).await?
        }
        None => {
            info!("Store: in-memory, empty");
            Value::Object(Default::default())
        }
    };
    Ok(MemoryStore::from_value(root).with_transaction_retries(config.transaction_retries))
}

async fn load_seed(path: &Path) -> Result<Value> {
    let seed_error = |reason: String| StoreError::Seed {
        path: path.display().to_string(),
        reason,
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| seed_error(e.to_string()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&raw).map_err(|e| seed_error(e.to_string()))
    } else {
        serde_json::from_str(&raw).map_err(|e| seed_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::DocumentStore;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_init_store_without_seed_is_empty() {
        let store = init_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.export().await, json!({}));
    }

    #[tokio::test]
    async fn test_init_store_from_json_seed() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"users": {{"u1": {{"balance": 40}}}}}}"#).unwrap();

        let config = StoreConfig {
            seed_path: Some(file.path().display().to_string()),
            ..StoreConfig::default()
        };
        let store = init_store(&config).await.unwrap();
        assert_eq!(store.get("users/u1/balance").await.unwrap(), Some(json!(40)));
    }

    #[tokio::test]
    async fn test_init_store_from_yaml_seed() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "config:\n  appSettings:\n    appName: Topup").unwrap();

        let config = StoreConfig {
            seed_path: Some(file.path().display().to_string()),
            ..StoreConfig::default()
        };
        let store = init_store(&config).await.unwrap();
        assert_eq!(
            store.get("config/appSettings/appName").await.unwrap(),
            Some(json!("Topup"))
        );
    }

    #[tokio::test]
    async fn test_init_store_missing_seed() {
        let config = StoreConfig {
            seed_path: Some("/nonexistent/seed.json".to_string()),
            ..StoreConfig::default()
        };
        assert!(matches!(
            init_store(&config).await,
            Err(StoreError::Seed { .. })
        ));
    }
}
