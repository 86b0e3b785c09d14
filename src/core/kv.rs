//! Opaque string key-value persistence.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
