//! Span creation utilities for data-access operations
//!
//! Provides functions for creating spans with consistent attributes across
//! the Mercata data-access crates.

use tracing::{Level, Span, span};

/// Create a span for a relational query
///
/// # Arguments
/// * `operation` - The operation being performed (e.g., "fetch_one", "execute")
/// * `table` - The table being queried
///
/// # Returns
/// A tracing span for relational query execution
pub fn query_span(operation: &str, table: &str) -> Span {
    span!(
        Level::DEBUG,
        "relational_query",
        operation = operation,
        table = table,
        rows = tracing::field::Empty,
    )
}

/// Create a span for a document-store operation
///
/// # Arguments
/// * `operation` - The operation being performed (e.g., "fetch", "update")
/// * `collection` - The collection being operated on
///
/// # Returns
/// A tracing span for document-store operations
pub fn document_span(operation: &str, collection: &str) -> Span {
    span!(
        Level::DEBUG,
        "document_operation",
        operation = operation,
        collection = collection,
        matched = tracing::field::Empty,
        modified = tracing::field::Empty,
    )
}

/// Create a span for a per-entity repository operation
///
/// # Arguments
/// * `repository` - The repository name (e.g., "supplier", "storefront")
/// * `operation` - The operation being performed
///
/// # Returns
/// A tracing span for repository operations
pub fn repository_span(repository: &str, operation: &str) -> Span {
    span!(
        Level::INFO,
        "repository_operation",
        repository = repository,
        operation = operation,
        outcome = tracing::field::Empty,
    )
}

/// Create a span for domain/record projection
///
/// # Arguments
/// * `entity` - The entity type being projected
///
/// # Returns
/// A tracing span for projection
pub fn projection_span(entity: &str) -> Span {
    span!(
        Level::DEBUG,
        "record_projection",
        entity = entity,
        dropped_fields = tracing::field::Empty,
    )
}

/// Record the row count of a completed relational query
///
/// # Arguments
/// * `span` - The span to record in
/// * `rows` - Number of rows fetched or affected
pub fn record_rows(span: &Span, rows: u64) {
    span.record("rows", rows);
}

/// Record matched/modified counts of a document update
///
/// # Arguments
/// * `span` - The span to record in
/// * `matched` - Number of documents matched
/// * `modified` - Number of documents modified
pub fn record_update_outcome(span: &Span, matched: u64, modified: u64) {
    span.record("matched", matched);
    span.record("modified", modified);
}

/// Record the outcome of a repository operation
///
/// # Arguments
/// * `span` - The span to record in
/// * `outcome` - The outcome ("ok" or "error")
pub fn record_outcome(span: &Span, outcome: &str) {
    span.record("outcome", outcome);
}

/// Record how many undeclared fields a projection dropped
///
/// # Arguments
/// * `span` - The span to record in
/// * `count` - Number of dropped fields
pub fn record_dropped_fields(span: &Span, count: usize) {
    span.record("dropped_fields", count);
}
