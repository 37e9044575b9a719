use crate::shared::error::SyncError;
use async_trait::async_trait;

/// Durable string slots provided by the host (SQLite file, in-memory map, ...).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SyncError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;
    async fn remove(&self, key: &str) -> Result<(), SyncError>;
}
