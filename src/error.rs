use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Guild not found: {0}")]
    TenantNotFound(String),

    #[error("Resource {id} not found in {collection}")]
    ResourceNotFound { id: String, collection: String },

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Session of guild {session} cannot be used against guild {target}")]
    SessionMismatch { session: String, target: String },

    #[error("Session already closed")]
    SessionClosed,

    #[error("Unit of work timed out after {0:?}")]
    TransactionTimeout(Duration),

    #[error("Level {0} is not in the exp table")]
    InvalidLevel(String),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>, collection: impl Into<String>) -> Self {
        StoreError::ResourceNotFound {
            id: id.into(),
            collection: collection.into(),
        }
    }

    pub fn is_tenant_not_found(&self) -> bool {
        matches!(self, StoreError::TenantNotFound(_))
    }

    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, StoreError::ResourceNotFound { .. })
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
