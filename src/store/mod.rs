pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::kv::KeyValueStore;
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens the on-disk store under the configured data path.
///
/// Falls back to an in-memory store when the data path cannot be resolved or
/// opened, so the application keeps working without persistence.
pub fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    let opened = config
        .default_data_path()
        .and_then(|path| DiskStore::open(&path.join("store")));

    match opened {
        Ok(store) => {
            debug!("Opened persistent store");
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Persistent store unavailable, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_store_uses_data_path() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            data_path: Some(dir.path().to_string_lossy().to_string()),
            ..AppConfig::default()
        };

        let store = open_store(&config);
        store.set("key", "value").await.unwrap();

        assert!(dir.path().join("store").exists());
        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_open_store_falls_back_to_memory() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let config = AppConfig {
            data_path: Some(blocker.to_string_lossy().to_string()),
            ..AppConfig::default()
        };

        let store = open_store(&config);
        store.set("key", "value").await.unwrap();
        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("value"));
    }
}
