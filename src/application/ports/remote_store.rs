use crate::domain::value_objects::{ActionPayload, EntityId, EntityKind};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Network or remote unavailability; the same call may succeed later.
    #[error("remote unavailable: {0}")]
    Transient(String),
    /// Validation failure, missing entity and similar rejections.
    #[error("remote rejected request: {0}")]
    Permanent(String),
}

/// CRUD surface of the remote data store, per entity kind.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn create(
        &self,
        entity: &EntityKind,
        fields: &ActionPayload,
    ) -> Result<EntityId, RemoteError>;
    async fn update(
        &self,
        entity: &EntityKind,
        id: &EntityId,
        fields: &ActionPayload,
    ) -> Result<(), RemoteError>;
    async fn delete(&self, entity: &EntityKind, id: &EntityId) -> Result<(), RemoteError>;
}
