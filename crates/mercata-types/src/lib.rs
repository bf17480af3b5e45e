//! # Mercata Types
//!
//! Shared type definitions for the Mercata data-access core.
//!
//! This crate provides the contract types exchanged between the access layers
//! and the storage drivers, ensuring a single source of truth and preventing
//! circular dependencies between the store and repository crates.

#![deny(unsafe_code)]

use serde_json::{Map, Value};

// ============================================================================
// Query Types
// ============================================================================

pub mod query;

pub use query::{ensure_identifier, NamedQuery, QueryError, SqlParams, SqlValue};

// ============================================================================
// Document Types
// ============================================================================

pub mod document;

pub use document::{DocFilter, DocUpdate, UpdateOutcome};

// ============================================================================
// Domain Types
// ============================================================================

pub mod business;

pub use business::{CatalogItem, PriceQuote, Storefront, SupplierBusiness};

// ============================================================================
// Records
// ============================================================================

/// An ordered mapping from column/field name to value, as produced by query
/// execution.
///
/// For the relational backend a record's shape is determined by the selected
/// columns; for the document backend, by the stored document minus its
/// engine-assigned identifier.
pub type Record = Map<String, Value>;

/// Convert a JSON object value into a [`Record`].
///
/// Returns `None` when the value is not an object.
pub fn record_from_value(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

// ============================================================================
// Entity Descriptors
// ============================================================================

/// The (table/collection name, human-readable name) pair supplied per
/// operation.
///
/// Used only for query construction and error messages; the access layer has
/// no static registry of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity {
    /// Table or collection name.
    pub table: &'static str,
    /// Human-readable entity name used in error messages.
    pub display: &'static str,
}

impl Entity {
    /// Create a new entity descriptor.
    pub const fn new(table: &'static str, display: &'static str) -> Self {
        Self { table, display }
    }
}

// ============================================================================
// Storage Mapping
// ============================================================================

/// Declares the storage field set of a domain type.
///
/// The schema-projection utility consumes `FIELDS` to decide which record
/// keys are copied into the domain type and which are dropped. Field names
/// must match the serde names of the type's fields.
pub trait StorageMapped {
    /// The declared storage field names of this type.
    const FIELDS: &'static [&'static str];
}
