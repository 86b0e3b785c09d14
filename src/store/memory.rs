use crate::core::kv::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store. Contents are lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.inner.lock().await;
        let value = store.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {}", key);
        } else {
            debug!("Store MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut store = self.inner.lock().await;
        debug!("Store SET for key: {}", key);
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.inner.lock().await;
        store.remove(key);
        debug!("Store REMOVE for key: {}", key);
        Ok(())
    }
}
