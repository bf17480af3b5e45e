//! # Mercata Store - Storage Driver Layer
//!
//! Defines the driver interfaces consumed by the access layers, the error
//! taxonomy drivers surface, and the shipped backends: an in-memory document
//! store, a recording SQL driver for testing and development, and a
//! `sqlx`-backed Postgres driver behind the `postgres` feature.
//!
//! Drivers are connection-pooled handles owned by the request lifecycle; the
//! access layer borrows them through [`DatabaseHandles`] and never closes
//! them.

#![deny(unsafe_code)]

use std::sync::Arc;

use async_trait::async_trait;
use mercata_types::{DocFilter, DocUpdate, NamedQuery, Record, UpdateOutcome};

pub mod error;
pub mod factory;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod recorder;

pub use error::{StorageError, StorageResult};

/// Engine-assigned document identifier field.
pub const ID_FIELD: &str = "_id";
pub use factory::{BackendType, StoreConfig, StoreFactory};
pub use memory::MemoryDocumentStore;
pub use recorder::{IssuedQuery, RecordingSqlDriver};

#[cfg(feature = "postgres")]
pub use postgres::PostgresDriver;

/// The abstract SQL driver interface.
///
/// Executes named-parameter query strings in three modes: single row, all
/// rows, and no result set. Implementations report failures as
/// [`StorageError`]; "no row matched" is `Ok(None)` / an empty vector, never
/// an error.
#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// Execute a query expected to produce at most one row.
    async fn fetch_one(&self, query: &NamedQuery) -> StorageResult<Option<Record>>;

    /// Execute a query and collect every produced row.
    async fn fetch_all(&self, query: &NamedQuery) -> StorageResult<Vec<Record>>;

    /// Execute a statement with no result set, returning the affected row
    /// count.
    async fn execute(&self, query: &NamedQuery) -> StorageResult<u64>;
}

/// The abstract document-store driver interface.
///
/// Documents are flat JSON objects carrying an engine-assigned `_id` field;
/// the driver returns them verbatim and the access layer strips the
/// identifier.
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    /// Find the first document matching the filter.
    async fn find_one(&self, collection: &str, filter: &DocFilter)
        -> StorageResult<Option<Record>>;

    /// Find every document matching the filter.
    async fn find(&self, collection: &str, filter: &DocFilter) -> StorageResult<Vec<Record>>;

    /// Insert one document.
    async fn insert_one(&self, collection: &str, document: Record) -> StorageResult<()>;

    /// Apply a structured update to the first document matching the filter.
    async fn update_one(
        &self,
        collection: &str,
        filter: &DocFilter,
        update: &DocUpdate,
    ) -> StorageResult<UpdateOutcome>;

    /// Delete the first document matching the filter, returning the count.
    async fn delete_one(&self, collection: &str, filter: &DocFilter) -> StorageResult<u64>;

    /// Delete every document matching the filter, returning the count.
    async fn delete_many(&self, collection: &str, filter: &DocFilter) -> StorageResult<u64>;
}

/// The per-request database handle pair.
///
/// Either handle may be absent when the surrounding deployment runs with a
/// single backend; repository constructors fail fast when the handle they
/// need is missing.
#[derive(Clone, Default)]
pub struct DatabaseHandles {
    /// The relational driver, shared across all repositories of one request.
    pub sql: Option<Arc<dyn SqlDriver>>,
    /// The document driver, shared across all repositories of one request.
    pub document: Option<Arc<dyn DocumentDriver>>,
}

impl DatabaseHandles {
    /// Handles with no configured backend.
    pub fn none() -> Self {
        Self::default()
    }

    /// In-memory handles for testing and development: a recording SQL driver
    /// and a memory document store.
    pub fn memory() -> Self {
        Self {
            sql: Some(Arc::new(RecordingSqlDriver::new())),
            document: Some(Arc::new(MemoryDocumentStore::new())),
        }
    }

    /// Replace the SQL handle, chainable.
    #[must_use]
    pub fn with_sql(mut self, sql: Arc<dyn SqlDriver>) -> Self {
        self.sql = Some(sql);
        self
    }

    /// Replace the document handle, chainable.
    #[must_use]
    pub fn with_document(mut self, document: Arc<dyn DocumentDriver>) -> Self {
        self.document = Some(document);
        self
    }
}

impl std::fmt::Debug for DatabaseHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandles")
            .field("sql", &self.sql.as_ref().map(|_| "<driver>"))
            .field("document", &self.document.as_ref().map(|_| "<driver>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_handles_are_empty() {
        let handles = DatabaseHandles::none();
        assert!(handles.sql.is_none());
        assert!(handles.document.is_none());
    }

    #[test]
    fn test_memory_handles_carry_both_backends() {
        let handles = DatabaseHandles::memory();
        assert!(handles.sql.is_some());
        assert!(handles.document.is_some());
    }
}
