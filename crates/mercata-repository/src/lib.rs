//! Dual-backend data-access layers for the Mercata marketplace backend.
//!
//! This crate provides the generic access layers that normalize CRUD
//! semantics, existence validation, create-if-absent insertion, and dynamic
//! partial-update query construction across a relational and a document
//! storage engine, behind a single error-translation contract.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Handlers / Resolvers                 │
//! │                     (external)                       │
//! ├──────────────────────────────────────────────────────┤
//! │                 Repository Layer                     │
//! │  SupplierBusinessRepository │ StorefrontRepository   │
//! │   (entity queries, projection, identifier codec)     │
//! ├──────────────────────────────────────────────────────┤
//! │                  Access Layers                       │
//! │  RelationalAccessLayer │ DocumentAccessLayer         │
//! │         │ BypassAccessLayer │ legacy adapters        │
//! │   (query construction, guards, error translation)    │
//! ├──────────────────────────────────────────────────────┤
//! │                  mercata-store                       │
//! │        SqlDriver / DocumentDriver traits             │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Call styles
//!
//! The access layers expose only non-raising operations: absence is
//! `Ok(None)`/`false`/an empty vector, and a matched create guard is a no-op
//! signal. The legacy raising generation lives in [`legacy`] as adapters
//! over the same operations. New development uses the base layers.
//!
//! # Error Handling
//!
//! All operations return [`AccessResult<T>`]. Driver failures are logged at
//! error severity and mapped onto the [`AccessError`] kinds; nothing is
//! retried at this layer.

#![deny(unsafe_code)]

pub mod bypass;
pub mod codec;
pub mod context;
pub mod document;
pub mod error;
pub mod legacy;
pub mod projection;
pub mod relational;
pub mod sql;
pub mod storefront;
pub mod supplier;

// Re-export main types for convenience
pub use bypass::BypassAccessLayer;
pub use context::RequestContext;
pub use document::{DocGuard, DocOutcome, DocumentAccessLayer};
pub use error::{AccessError, AccessResult};
pub use legacy::{LegacyDocument, LegacyRelational};
pub use projection::{ProjectionError, SpecialCasts, domain_to_record, record_to_domain};
pub use relational::{Guard, InsertOutcome, RecordId, RelationalAccessLayer};
pub use sql::{Cte, Direction, Filter};
pub use storefront::StorefrontRepository;
pub use supplier::SupplierBusinessRepository;
