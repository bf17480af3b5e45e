//! Generic document access layer.
//!
//! Equivalent operation set over a document store, plus the in-place
//! list-element upsert used for embedded sub-document collections. The
//! engine-assigned `_id` field is stripped from every returned record;
//! business identifiers embedded in documents are explicit fields, encoded
//! through the identifier codec.

use std::sync::Arc;

use mercata_store::{DocumentDriver, ID_FIELD};
use mercata_types::{DocFilter, DocUpdate, Entity, Record};
use serde_json::Value;

use crate::error::{AccessError, AccessResult};

/// A (field, value) predicate enforcing create-if-absent / update-if-present
/// semantics on the document side.
///
/// Implemented as a scoped `find_one` probe; the probe and the write race
/// under concurrent writers, as on the relational side.
#[derive(Debug, Clone, PartialEq)]
pub struct DocGuard {
    pub field: String,
    pub value: Value,
}

impl DocGuard {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }
}

/// Result of a guarded document insert. `SkippedExisting` is a no-op signal,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocOutcome {
    Inserted,
    SkippedExisting,
}

/// The document access layer, bound to one request's document driver handle.
#[derive(Clone)]
pub struct DocumentAccessLayer {
    driver: Arc<dyn DocumentDriver>,
}

fn strip_id(mut record: Record) -> Record {
    record.remove(ID_FIELD);
    record
}

impl DocumentAccessLayer {
    /// Bind the layer to a driver handle. The handle is borrowed for the
    /// request; the layer never closes it.
    pub fn new(driver: Arc<dyn DocumentDriver>) -> Self {
        Self { driver }
    }

    /// Insert a document, optionally guarded by a create-if-absent predicate.
    pub async fn insert(
        &self,
        entity: Entity,
        document: Record,
        guard: Option<DocGuard>,
    ) -> AccessResult<DocOutcome> {
        if let Some(guard) = guard {
            let probe = DocFilter::new().field(guard.field.clone(), guard.value.clone());
            if self.probe(entity, &probe).await? {
                tracing::debug!(
                    entity = entity.display,
                    field = guard.field,
                    "insert skipped, guard matched existing document"
                );
                return Ok(DocOutcome::SkippedExisting);
            }
        }
        self.driver
            .insert_one(entity.table, document)
            .await
            .map_err(|e| AccessError::insert_failure(entity, &e))?;
        Ok(DocOutcome::Inserted)
    }

    /// Fetch at most one document, `_id`-stripped. Absence is `Ok(None)`.
    pub async fn fetch_one(
        &self,
        entity: Entity,
        filter: &DocFilter,
    ) -> AccessResult<Option<Record>> {
        let found = self
            .driver
            .find_one(entity.table, filter)
            .await
            .map_err(|e| AccessError::fetch_failure(entity, &e))?;
        Ok(found.map(strip_id))
    }

    /// Fetch every matching document, `_id`-stripped. Empty result is normal.
    pub async fn fetch_many(
        &self,
        entity: Entity,
        filter: &DocFilter,
    ) -> AccessResult<Vec<Record>> {
        let found = self
            .driver
            .find(entity.table, filter)
            .await
            .map_err(|e| AccessError::fetch_failure(entity, &e))?;
        Ok(found.into_iter().map(strip_id).collect())
    }

    /// Replace fields of the first matching document, optionally guarded by
    /// an update-if-present predicate.
    ///
    /// With a guard, a missing referenced document reports `Ok(false)`
    /// without raising and without issuing the update. An empty change set
    /// short-circuits to `Ok(true)` with no driver call.
    pub async fn update(
        &self,
        entity: Entity,
        filter: &DocFilter,
        changes: Record,
        guard: Option<DocGuard>,
    ) -> AccessResult<bool> {
        if changes.is_empty() {
            tracing::debug!(entity = entity.display, "update skipped, no changed fields");
            return Ok(true);
        }
        if let Some(guard) = guard {
            let probe = DocFilter::new().field(guard.field.clone(), guard.value.clone());
            if !self.probe(entity, &probe).await? {
                tracing::debug!(
                    entity = entity.display,
                    field = guard.field,
                    "update skipped, guard matched no document"
                );
                return Ok(false);
            }
        }
        let outcome = self
            .driver
            .update_one(entity.table, filter, &DocUpdate::Set(changes))
            .await
            .map_err(|e| AccessError::update_failure(entity, &e))?;
        Ok(outcome.matched > 0)
    }

    /// Whether any document matches the filter. Never raises for absence.
    pub async fn exists(&self, entity: Entity, filter: &DocFilter) -> AccessResult<bool> {
        self.probe(entity, filter).await
    }

    /// Upsert one element of an embedded array.
    ///
    /// Probes for a parent document (matched by `document_field` =
    /// `document_id`) whose array `list_name` already contains an element
    /// with `element_field` = `element_id`. When found, only the matched
    /// element's fields are updated in place; otherwise a new element built
    /// from `data` plus the identifying field is pushed to the front of the
    /// array.
    ///
    /// Returns whether a parent document was matched at all.
    ///
    /// The probe and the conditional write are two driver round-trips with
    /// no transaction linking them; a concurrent writer can insert between
    /// them and produce a duplicate array element.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_list_element(
        &self,
        entity: Entity,
        document_field: &str,
        document_id: Value,
        element_field: &str,
        element_id: Value,
        list_name: &str,
        data: Record,
    ) -> AccessResult<bool> {
        let parent = DocFilter::new().field(document_field, document_id.clone());
        let element_probe = parent
            .clone()
            .field(format!("{list_name}.{element_field}"), element_id.clone());

        let update = if self.probe(entity, &element_probe).await? {
            DocUpdate::SetListElement {
                array: list_name.to_string(),
                element_field: element_field.to_string(),
                element_id,
                changes: data,
            }
        } else {
            let mut element = data;
            element.insert(element_field.to_string(), element_id);
            DocUpdate::PushFront {
                array: list_name.to_string(),
                element: Value::Object(element),
            }
        };

        let outcome = self
            .driver
            .update_one(entity.table, &parent, &update)
            .await
            .map_err(|e| AccessError::update_failure(entity, &e))?;
        Ok(outcome.matched > 0)
    }

    /// Delete the first matching document. Returns whether one was deleted.
    pub async fn delete(&self, entity: Entity, filter: &DocFilter) -> AccessResult<bool> {
        let deleted = self
            .driver
            .delete_one(entity.table, filter)
            .await
            .map_err(|e| AccessError::execute_failure(entity, &e))?;
        Ok(deleted > 0)
    }

    /// Delete every matching document, returning the count.
    pub async fn delete_many(&self, entity: Entity, filter: &DocFilter) -> AccessResult<u64> {
        self.driver
            .delete_many(entity.table, filter)
            .await
            .map_err(|e| AccessError::execute_failure(entity, &e))
    }

    /// Unrestricted passthrough find over an arbitrary collection,
    /// `_id`-stripped. The document-side escape hatch.
    pub async fn raw_find(&self, collection: &str, filter: &DocFilter) -> AccessResult<Vec<Record>> {
        let entity = Entity::new("", "raw find");
        let found = self
            .driver
            .find(collection, filter)
            .await
            .map_err(|e| AccessError::fetch_failure(entity, &e))?;
        Ok(found.into_iter().map(strip_id).collect())
    }

    async fn probe(&self, entity: Entity, filter: &DocFilter) -> AccessResult<bool> {
        let found = self
            .driver
            .find_one(entity.table, filter)
            .await
            .map_err(|e| AccessError::fetch_failure(entity, &e))?;
        Ok(found.is_some())
    }
}
