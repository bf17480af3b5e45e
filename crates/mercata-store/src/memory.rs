//! In-memory document backend for testing and development.
//!
//! Implements the full [`DocumentDriver`] contract over JSON documents held
//! in process memory: equality filters with embedded-array paths, structured
//! updates, and auto-assigned `_id` fields. Collections are created on first
//! insert, matching the lazy-creation behavior of production document
//! engines.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mercata_types::{DocFilter, DocUpdate, Record, UpdateOutcome};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{DocumentDriver, ID_FIELD, StorageResult};

#[derive(Default)]
struct Collection {
    next_id: i64,
    documents: Vec<Record>,
}

/// In-memory document store with full filter and update semantics.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held by a collection.
    pub async fn collection_size(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, |c| c.documents.len())
    }
}

/// Apply a structured update to one document, reporting whether any field
/// actually changed.
fn apply_update(document: &mut Record, update: &DocUpdate) -> bool {
    match update {
        DocUpdate::Set(changes) => {
            let mut changed = false;
            for (field, value) in changes {
                if document.get(field) != Some(value) {
                    document.insert(field.clone(), value.clone());
                    changed = true;
                }
            }
            changed
        },
        DocUpdate::PushFront { array, element } => {
            let slot = document.entry(array.clone()).or_insert_with(|| Value::Array(Vec::new()));
            match slot {
                Value::Array(elements) => {
                    elements.insert(0, element.clone());
                    true
                },
                _ => false,
            }
        },
        DocUpdate::SetListElement { array, element_field, element_id, changes } => {
            let Some(Value::Array(elements)) = document.get_mut(array) else {
                return false;
            };
            let Some(matched) = elements.iter_mut().find_map(|element| {
                element.as_object_mut().filter(|obj| obj.get(element_field) == Some(element_id))
            }) else {
                return false;
            };
            let mut changed = false;
            for (field, value) in changes {
                if matched.get(field) != Some(value) {
                    matched.insert(field.clone(), value.clone());
                    changed = true;
                }
            }
            changed
        },
    }
}

#[async_trait]
impl DocumentDriver for MemoryDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &DocFilter,
    ) -> StorageResult<Option<Record>> {
        let collections = self.collections.read().await;
        let found = collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|doc| filter.matches(doc)).cloned());
        Ok(found)
    }

    async fn find(&self, collection: &str, filter: &DocFilter) -> StorageResult<Vec<Record>> {
        let collections = self.collections.read().await;
        let found = collections.get(collection).map_or_else(Vec::new, |c| {
            c.documents.iter().filter(|doc| filter.matches(doc)).cloned().collect()
        });
        Ok(found)
    }

    async fn insert_one(&self, collection: &str, mut document: Record) -> StorageResult<()> {
        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();
        entry.next_id += 1;
        document.insert(ID_FIELD.to_string(), Value::from(entry.next_id));
        entry.documents.push(document);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &DocFilter,
        update: &DocUpdate,
    ) -> StorageResult<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(UpdateOutcome::default());
        };
        let Some(document) = entry.documents.iter_mut().find(|doc| filter.matches(doc)) else {
            return Ok(UpdateOutcome::default());
        };
        let modified = apply_update(document, update);
        Ok(UpdateOutcome { matched: 1, modified: u64::from(modified) })
    }

    async fn delete_one(&self, collection: &str, filter: &DocFilter) -> StorageResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match entry.documents.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                entry.documents.remove(index);
                Ok(1)
            },
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &DocFilter) -> StorageResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = entry.documents.len();
        entry.documents.retain(|doc| !filter.matches(doc));
        Ok((before - entry.documents.len()) as u64)
    }
}
