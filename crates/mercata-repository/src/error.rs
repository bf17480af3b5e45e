//! The typed error contract of the access layers.
//!
//! The access layer recovers nothing: every unexpected driver failure is
//! logged at error severity and re-raised as one of the [`AccessError`]
//! kinds. "Zero rows/documents matched" is an empty result or `false` in the
//! current call style, never an error; only the legacy raising adapters turn
//! those sentinels into `NotFound`/`DuplicateFound`/`UpdateFailed`.

use mercata_store::StorageError;
use mercata_types::{Entity, QueryError};

/// Result type alias for access-layer operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors surfaced by the access layers and the repositories built on them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccessError {
    /// The required database handle is absent or the backend is unreachable.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A read operation failed at the driver.
    #[error("fetch failed for {entity}: {message}")]
    FetchFailed { entity: String, message: String },

    /// A write operation with no more specific kind failed at the driver.
    #[error("execute failed for {entity}: {message}")]
    ExecuteFailed { entity: String, message: String },

    /// The expected row/document is absent. Raised by the legacy adapters
    /// only.
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// A create guard matched an existing row/document. Raised by the legacy
    /// adapters only.
    #[error("{entity} already exists")]
    DuplicateFound { entity: String },

    /// An insert failed at the driver.
    #[error("insert failed for {entity}: {message}")]
    InsertFailed { entity: String, message: String },

    /// An update failed at the driver, or (legacy adapters) its guard did not
    /// match.
    #[error("update failed for {entity}: {message}")]
    UpdateFailed { entity: String, message: String },

    /// The addressed table/collection does not exist at the backend.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
}

// Driver failures are mapped per operation kind so a failed read and a failed
// write report differently, while connection and missing-collection
// conditions keep their own kind regardless of the operation.

impl AccessError {
    pub(crate) fn fetch_failure(entity: Entity, error: &StorageError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "fetch failed");
        match error {
            StorageError::Connection(message) => Self::ConnectionFailed(message.clone()),
            StorageError::CollectionNotFound(message) => Self::CollectionNotFound(message.clone()),
            _ => Self::FetchFailed {
                entity: entity.display.to_string(),
                message: error.to_string(),
            },
        }
    }

    pub(crate) fn insert_failure(entity: Entity, error: &StorageError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "insert failed");
        match error {
            StorageError::Connection(message) => Self::ConnectionFailed(message.clone()),
            StorageError::CollectionNotFound(message) => Self::CollectionNotFound(message.clone()),
            _ => Self::InsertFailed {
                entity: entity.display.to_string(),
                message: error.to_string(),
            },
        }
    }

    pub(crate) fn update_failure(entity: Entity, error: &StorageError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "update failed");
        match error {
            StorageError::Connection(message) => Self::ConnectionFailed(message.clone()),
            StorageError::CollectionNotFound(message) => Self::CollectionNotFound(message.clone()),
            _ => Self::UpdateFailed {
                entity: entity.display.to_string(),
                message: error.to_string(),
            },
        }
    }

    pub(crate) fn execute_failure(entity: Entity, error: &StorageError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "execute failed");
        match error {
            StorageError::Connection(message) => Self::ConnectionFailed(message.clone()),
            StorageError::CollectionNotFound(message) => Self::CollectionNotFound(message.clone()),
            _ => Self::ExecuteFailed {
                entity: entity.display.to_string(),
                message: error.to_string(),
            },
        }
    }

    /// An invalid generated query must fail before it reaches the driver.
    pub(crate) fn rejected_read(entity: Entity, error: &QueryError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "query rejected");
        Self::FetchFailed { entity: entity.display.to_string(), message: error.to_string() }
    }

    pub(crate) fn rejected_write(entity: Entity, error: &QueryError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "query rejected");
        Self::ExecuteFailed { entity: entity.display.to_string(), message: error.to_string() }
    }

    /// A record could not be projected onto its domain type.
    pub(crate) fn projection(entity: Entity, error: &crate::projection::ProjectionError) -> Self {
        tracing::error!(entity = entity.display, table = entity.table, %error, "projection failed");
        Self::FetchFailed { entity: entity.display.to_string(), message: error.to_string() }
    }
}
