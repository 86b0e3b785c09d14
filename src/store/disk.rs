use crate::core::kv::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION_NAME: &str = "denominations";

/// Persistent store backed by a fjall partition.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
            .context("Failed to open store partition")?;

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.partition.get(key)? {
            Some(value) => {
                debug!("Store HIT for key: {}", key);
                let text = String::from_utf8(value.to_vec())
                    .with_context(|| format!("Stored value for {key} is not valid UTF-8"))?;
                Ok(Some(text))
            }
            None => {
                debug!("Store MISS for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store SET for key: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.partition.remove(key)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store REMOVE for key: {}", key);
        Ok(())
    }
}
