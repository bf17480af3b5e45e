//! Backend selection and driver construction.
//!
//! Deployments pick a backend by name; the factory turns that choice into a
//! ready [`DatabaseHandles`] pair. The memory backend needs no configuration;
//! the Postgres backend (behind the `postgres` feature) requires a database
//! URL.

use std::str::FromStr;
use std::sync::Arc;

use crate::{DatabaseHandles, MemoryDocumentStore, RecordingSqlDriver, StorageError, StorageResult};

// ============================================================================
// SECTION: Backend Selection
// ============================================================================

/// Which storage backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// In-memory drivers for testing and development.
    Memory,
    /// Connection-pooled Postgres via `sqlx`.
    #[cfg(feature = "postgres")]
    Postgres,
}

impl FromStr for BackendType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            #[cfg(feature = "postgres")]
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(StorageError::connection(format!("unknown backend type: {other}"))),
        }
    }
}

/// Configuration consumed by [`StoreFactory::create`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend to construct.
    pub backend: BackendType,
    /// Database URL for the SQL driver. Required by the Postgres backend,
    /// ignored by the memory backend.
    pub sql_url: Option<String>,
}

impl StoreConfig {
    /// Configuration for the in-memory backend.
    pub fn memory() -> Self {
        Self { backend: BackendType::Memory, sql_url: None }
    }

    /// Configuration for the Postgres backend.
    #[cfg(feature = "postgres")]
    pub fn postgres(url: impl Into<String>) -> Self {
        Self { backend: BackendType::Postgres, sql_url: Some(url.into()) }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::memory()
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Constructs driver handles from a [`StoreConfig`].
pub struct StoreFactory;

impl StoreFactory {
    /// Build the handles for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] when the Postgres backend is
    /// selected without a URL or the pool cannot be established.
    pub async fn create(config: &StoreConfig) -> StorageResult<DatabaseHandles> {
        tracing::debug!(backend = ?config.backend, "constructing storage backend");
        match config.backend {
            BackendType::Memory => Ok(DatabaseHandles {
                sql: Some(Arc::new(RecordingSqlDriver::new())),
                document: Some(Arc::new(MemoryDocumentStore::new())),
            }),
            #[cfg(feature = "postgres")]
            BackendType::Postgres => {
                let url = config.sql_url.as_deref().ok_or_else(|| {
                    StorageError::connection("postgres backend requires a database URL")
                })?;
                let driver = crate::PostgresDriver::connect(url).await?;
                Ok(DatabaseHandles {
                    sql: Some(Arc::new(driver)),
                    // Document collections are served by the external document
                    // engine; its handle is attached by the deployment.
                    document: None,
                })
            },
        }
    }
}
