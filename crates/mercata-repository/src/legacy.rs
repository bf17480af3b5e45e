//! Legacy raising call style.
//!
//! Earlier call sites expected absence and guard conflicts to raise instead
//! of returning sentinel results. That behavior survives here as thin
//! adapters over the base layers: each method calls the non-raising
//! operation and raises `NotFound`/`DuplicateFound`/`UpdateFailed` on its
//! sentinel result, so the logic exists in exactly one place. New
//! development uses the base layers directly.

use mercata_types::{DocFilter, Entity, Record, SqlParams, SqlValue};

use crate::{
    document::{DocGuard, DocOutcome, DocumentAccessLayer},
    error::{AccessError, AccessResult},
    relational::{Guard, InsertOutcome, RecordId, RelationalAccessLayer},
    sql::Filter,
};

/// Raising adapter over [`RelationalAccessLayer`].
pub struct LegacyRelational<'a> {
    inner: &'a RelationalAccessLayer,
}

impl<'a> LegacyRelational<'a> {
    pub fn new(inner: &'a RelationalAccessLayer) -> Self {
        Self { inner }
    }

    /// Like `fetch_one`, but absence raises [`AccessError::NotFound`].
    pub async fn get_one(
        &self,
        entity: Entity,
        id_column: &str,
        id: impl Into<SqlValue>,
        columns: &[&str],
    ) -> AccessResult<Record> {
        self.inner
            .fetch_one(entity, id_column, id, columns)
            .await?
            .ok_or(AccessError::NotFound { entity: entity.display.to_string() })
    }

    /// Like `insert`, but a matched guard raises
    /// [`AccessError::DuplicateFound`].
    pub async fn create(
        &self,
        entity: Entity,
        values: SqlParams,
        guard: Option<Guard>,
    ) -> AccessResult<RecordId> {
        match self.inner.insert(entity, values, guard).await? {
            InsertOutcome::Created(id) => Ok(id),
            InsertOutcome::AlreadyExists => {
                Err(AccessError::DuplicateFound { entity: entity.display.to_string() })
            },
        }
    }

    /// Like `update`, but a guard matching no row raises
    /// [`AccessError::UpdateFailed`].
    pub async fn update(
        &self,
        entity: Entity,
        changes: SqlParams,
        filter: &Filter,
        guard: Option<Guard>,
    ) -> AccessResult<()> {
        if self.inner.update(entity, changes, filter, guard).await? {
            Ok(())
        } else {
            Err(AccessError::UpdateFailed {
                entity: entity.display.to_string(),
                message: "referenced row does not exist".to_string(),
            })
        }
    }
}

/// Raising adapter over [`DocumentAccessLayer`].
pub struct LegacyDocument<'a> {
    inner: &'a DocumentAccessLayer,
}

impl<'a> LegacyDocument<'a> {
    pub fn new(inner: &'a DocumentAccessLayer) -> Self {
        Self { inner }
    }

    /// Like `fetch_one`, but absence raises [`AccessError::NotFound`].
    pub async fn get_one(&self, entity: Entity, filter: &DocFilter) -> AccessResult<Record> {
        self.inner
            .fetch_one(entity, filter)
            .await?
            .ok_or(AccessError::NotFound { entity: entity.display.to_string() })
    }

    /// Like `insert`, but a matched guard raises
    /// [`AccessError::DuplicateFound`].
    pub async fn create(
        &self,
        entity: Entity,
        document: Record,
        guard: Option<DocGuard>,
    ) -> AccessResult<()> {
        match self.inner.insert(entity, document, guard).await? {
            DocOutcome::Inserted => Ok(()),
            DocOutcome::SkippedExisting => {
                Err(AccessError::DuplicateFound { entity: entity.display.to_string() })
            },
        }
    }

    /// Like `update`, but a guard matching no document raises
    /// [`AccessError::UpdateFailed`].
    pub async fn update(
        &self,
        entity: Entity,
        filter: &DocFilter,
        changes: Record,
        guard: Option<DocGuard>,
    ) -> AccessResult<()> {
        if self.inner.update(entity, filter, changes, guard).await? {
            Ok(())
        } else {
            Err(AccessError::UpdateFailed {
                entity: entity.display.to_string(),
                message: "referenced document does not exist".to_string(),
            })
        }
    }
}
