//! Storage abstractions for the cart store
//!
//! The cart is persisted as one serialized string under a fixed key. Any
//! backend that can hold `key -> string` pairs across restarts fits.

use async_trait::async_trait;

use crate::errors::StorageError;

pub mod json_file_kv;
pub mod memory;

pub use json_file_kv::JsonFileKv;
pub use memory::MemoryKv;

/// Durable string key-value store.
#[async_trait]
pub trait PersistentKv: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}
