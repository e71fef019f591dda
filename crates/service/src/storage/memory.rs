use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PersistentKv;
use crate::errors::StorageError;

/// In-process key-value store. Survives nothing, handy for tests and demos.
#[derive(Default)]
pub struct MemoryKv {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry.
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(key.to_string(), value.into());
        Self { inner: RwLock::new(map) }
    }
}

#[async_trait]
impl PersistentKv for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
