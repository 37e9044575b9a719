use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The durable queue could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The remote call failed in a way that may succeed later.
    #[error("Transient delivery error: {0}")]
    TransientDelivery(String),

    /// The remote store rejected the action; retrying cannot succeed.
    #[error("Permanent delivery error: {0}")]
    PermanentDelivery(String),

    #[error("Action {action_id} dead-lettered after {retries} attempts")]
    DeadLettered { action_id: String, retries: u32 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SyncError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::TransientDelivery(_))
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, SyncError::PermanentDelivery(_))
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for SyncError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SyncError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
