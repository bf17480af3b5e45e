//! Request-scoped access to the database handles.
//!
//! A [`RequestContext`] is created once per inbound request by the
//! surrounding request-lifecycle collaborator and handed to repository
//! constructors. Construction of a layer fails fast with
//! [`AccessError::ConnectionFailed`] when the expected handle is absent.

use mercata_store::DatabaseHandles;

use crate::{
    document::DocumentAccessLayer,
    error::{AccessError, AccessResult},
    relational::RelationalAccessLayer,
};

/// The per-request context carrying the backend driver handles.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub database: DatabaseHandles,
}

impl RequestContext {
    pub fn new(database: DatabaseHandles) -> Self {
        Self { database }
    }

    /// The relational access layer for this request.
    ///
    /// # Errors
    ///
    /// Fails fast with [`AccessError::ConnectionFailed`] when no SQL handle
    /// is configured.
    pub fn sql(&self) -> AccessResult<RelationalAccessLayer> {
        let driver = self
            .database
            .sql
            .clone()
            .ok_or_else(|| AccessError::ConnectionFailed("no SQL handle configured".to_string()))?;
        Ok(RelationalAccessLayer::new(driver))
    }

    /// The document access layer for this request.
    ///
    /// # Errors
    ///
    /// Fails fast with [`AccessError::ConnectionFailed`] when no document
    /// handle is configured.
    pub fn documents(&self) -> AccessResult<DocumentAccessLayer> {
        let driver = self.database.document.clone().ok_or_else(|| {
            AccessError::ConnectionFailed("no document handle configured".to_string())
        })?;
        Ok(DocumentAccessLayer::new(driver))
    }
}
