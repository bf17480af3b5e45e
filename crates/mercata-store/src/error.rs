//! Storage error types surfaced by drivers.

/// Result type alias for driver operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors a storage driver can surface.
///
/// The access layer maps these onto its own error contract per operation,
/// so a failed read and a failed write report differently to callers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The backend is unreachable or the connection handle is unusable.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed the statement.
    #[error("execution error: {0}")]
    Execution(String),

    /// The addressed table/collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A row or document could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}
