use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Collection not found.
    #[error("Collection not found: {collection_id}")]
    CollectionNotFound { collection_id: Uuid },

    /// Collection exists but has no preference row to sync against.
    #[error("Collection has no preferences: {collection_id}")]
    MissingPreferences { collection_id: Uuid },

    /// Property row expected after upsert but absent.
    #[error("Property not found for provider id {provider_id}")]
    PropertyNotFound { provider_id: i64 },
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
