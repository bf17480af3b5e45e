//! Generic relational access layer.
//!
//! Translates abstract create/read/update/search/exists operations into
//! parameterized SQL and executes them through the bound driver, uniformly
//! converting driver failures into [`AccessError`]. Absence is a normal
//! outcome for every read; only the legacy adapters raise on it.

use std::sync::Arc;

use mercata_store::SqlDriver;
use mercata_types::{Entity, NamedQuery, Record, SqlParams, SqlValue};

use crate::{
    error::{AccessError, AccessResult},
    sql::{self, Cte, Direction, Filter},
};

/// An optional (column, value) predicate enforcing create-if-absent /
/// update-if-present semantics.
///
/// The guard probe and the subsequent write are two driver round-trips with
/// no transaction linking them, so concurrent writers race between the probe
/// and the write. Callers needing a hard guarantee must also enforce a
/// uniqueness constraint at the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    pub column: String,
    pub value: SqlValue,
}

impl Guard {
    pub fn new(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self { column: column.into(), value: value.into() }
    }
}

/// The identifier reported for a created row.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordId {
    /// The `id` value supplied with the insert.
    Single(SqlValue),
    /// All supplied values, for association tables without a surrogate key.
    Composite(Vec<SqlValue>),
}

/// Result of a guarded insert. `AlreadyExists` is a no-op signal, not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(RecordId),
    AlreadyExists,
}

/// The relational access layer, bound to one request's SQL driver handle.
#[derive(Clone)]
pub struct RelationalAccessLayer {
    driver: Arc<dyn SqlDriver>,
}

impl RelationalAccessLayer {
    /// Bind the layer to a driver handle. The handle is borrowed for the
    /// request; the layer never closes it.
    pub fn new(driver: Arc<dyn SqlDriver>) -> Self {
        Self { driver }
    }

    /// Insert a row, optionally guarded by a create-if-absent predicate.
    ///
    /// With a guard, a probe restricted to the guard column runs first; a
    /// match short-circuits to [`InsertOutcome::AlreadyExists`] without
    /// inserting. The reported [`RecordId`] is the supplied `id` value, or
    /// the tuple of all supplied values when no `id` key was supplied.
    ///
    /// # Errors
    ///
    /// Probe failures map to fetch kinds, insert failures to
    /// [`AccessError::InsertFailed`].
    pub async fn insert(
        &self,
        entity: Entity,
        values: SqlParams,
        guard: Option<Guard>,
    ) -> AccessResult<InsertOutcome> {
        if let Some(guard) = guard {
            if self.guard_matches(entity, &guard).await? {
                tracing::debug!(
                    entity = entity.display,
                    column = guard.column,
                    "insert skipped, guard matched existing row"
                );
                return Ok(InsertOutcome::AlreadyExists);
            }
        }

        let statement = sql::insert_statement(entity.table, &values)
            .map_err(|e| AccessError::rejected_write(entity, &e))?;
        let id = match values.get("id") {
            Some(value) => RecordId::Single(value.clone()),
            None => RecordId::Composite(values.clone().into_values()),
        };
        let query = sql::checked(NamedQuery::new(statement, values))
            .map_err(|e| AccessError::rejected_write(entity, &e))?;
        self.driver
            .execute(&query)
            .await
            .map_err(|e| AccessError::insert_failure(entity, &e))?;
        Ok(InsertOutcome::Created(id))
    }

    /// Fetch at most one row by identifier column. Absence is `Ok(None)`,
    /// never an error.
    pub async fn fetch_one(
        &self,
        entity: Entity,
        id_column: &str,
        id: impl Into<SqlValue>,
        columns: &[&str],
    ) -> AccessResult<Option<Record>> {
        let filter = Filter::new().eq(id_column, id);
        let (body, params) =
            filter.to_sql().map_err(|e| AccessError::rejected_read(entity, &e))?;
        let statement = sql::select_statement(entity.table, columns, &body, None)
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        self.driver.fetch_one(&query).await.map_err(|e| AccessError::fetch_failure(entity, &e))
    }

    /// Fetch one representative row per partition via
    /// `ROW_NUMBER() OVER (PARTITION BY ... ORDER BY ...)` filtered to rank 1.
    ///
    /// Ties in the ordering key break arbitrarily at the engine; callers must
    /// choose an ordering key with enough resolution to avoid nondeterminism.
    pub async fn fetch_ranked(
        &self,
        entity: Entity,
        columns: &[&str],
        partition_by: &str,
        order_by: &str,
        direction: Direction,
        filter: &Filter,
    ) -> AccessResult<Vec<Record>> {
        let (body, params) =
            filter.to_sql().map_err(|e| AccessError::rejected_read(entity, &e))?;
        let statement =
            sql::ranked_statement(entity.table, columns, partition_by, order_by, direction, &body)
                .map_err(|e| AccessError::rejected_read(entity, &e))?;
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        self.driver.fetch_all(&query).await.map_err(|e| AccessError::fetch_failure(entity, &e))
    }

    /// The single representative row, for callers whose filter pins one
    /// partition.
    pub async fn fetch_ranked_one(
        &self,
        entity: Entity,
        columns: &[&str],
        partition_by: &str,
        order_by: &str,
        direction: Direction,
        filter: &Filter,
    ) -> AccessResult<Option<Record>> {
        let mut rows =
            self.fetch_ranked(entity, columns, partition_by, order_by, direction, filter).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    /// Update rows matching the filter, optionally guarded by an
    /// update-if-present predicate.
    ///
    /// With a guard, a missing referenced row reports `Ok(false)` without
    /// raising and without issuing the update. Zero changed fields
    /// short-circuits to `Ok(true)` with no driver call. The SET clause is
    /// built from the supplied changes only; no diffing.
    pub async fn update(
        &self,
        entity: Entity,
        changes: SqlParams,
        filter: &Filter,
        guard: Option<Guard>,
    ) -> AccessResult<bool> {
        if changes.is_empty() {
            tracing::debug!(entity = entity.display, "update skipped, no changed fields");
            return Ok(true);
        }
        if let Some(guard) = guard {
            if !self.guard_matches(entity, &guard).await? {
                tracing::debug!(
                    entity = entity.display,
                    column = guard.column,
                    "update skipped, guard matched no row"
                );
                return Ok(false);
            }
        }

        let (body, mut params) =
            filter.to_sql().map_err(|e| AccessError::rejected_write(entity, &e))?;
        let statement = sql::update_statement(entity.table, &changes, &body)
            .map_err(|e| AccessError::rejected_write(entity, &e))?;
        params.merge(sql::prefixed_params("set_", &changes));
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_write(entity, &e))?;
        self.driver
            .execute(&query)
            .await
            .map_err(|e| AccessError::update_failure(entity, &e))?;
        Ok(true)
    }

    /// Search with a structured filter and an optional CTE prefix. Empty
    /// result is normal.
    pub async fn find(
        &self,
        entity: Entity,
        columns: &[&str],
        filter: &Filter,
        cte: Option<&Cte>,
    ) -> AccessResult<Vec<Record>> {
        let (body, mut params) =
            filter.to_sql().map_err(|e| AccessError::rejected_read(entity, &e))?;
        let statement = sql::select_statement(entity.table, columns, &body, cte)
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        if let Some(cte) = cte {
            params.merge(cte.params().clone());
        }
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        self.driver.fetch_all(&query).await.map_err(|e| AccessError::fetch_failure(entity, &e))
    }

    /// Bounded existence probe. Never raises for absence.
    pub async fn exists(
        &self,
        entity: Entity,
        id_column: &str,
        id: impl Into<SqlValue>,
    ) -> AccessResult<bool> {
        let statement = sql::exists_statement(entity.table, id_column)
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        let params = SqlParams::new().with(id_column, id);
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        let row = self
            .driver
            .fetch_one(&query)
            .await
            .map_err(|e| AccessError::fetch_failure(entity, &e))?;
        Ok(row.is_some())
    }

    /// Multi-row insert with a row-count-sized placeholder block. A missing
    /// column in a row binds NULL.
    pub async fn bulk_insert(
        &self,
        entity: Entity,
        columns: &[&str],
        rows: Vec<SqlParams>,
    ) -> AccessResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let statement = sql::bulk_insert_statement(entity.table, columns, rows.len())
            .map_err(|e| AccessError::rejected_write(entity, &e))?;
        let mut params = SqlParams::new();
        for (index, row) in rows.iter().enumerate() {
            for column in columns {
                let value = row.get(column).cloned().unwrap_or(SqlValue::Null);
                params.set(format!("{column}_{index}"), value);
            }
        }
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_write(entity, &e))?;
        self.driver
            .execute(&query)
            .await
            .map_err(|e| AccessError::insert_failure(entity, &e))?;
        Ok(())
    }

    /// The trusted escape hatch for shapes the structured operations cannot
    /// express: multi-join aggregates, pagination, reporting queries.
    ///
    /// The only relational operation accepting caller-constructed SQL text;
    /// values must still arrive through named parameters, which are validated
    /// against the template before dispatch.
    pub async fn raw_query(&self, entity: Entity, query: NamedQuery) -> AccessResult<Vec<Record>> {
        let query = sql::checked(query).map_err(|e| AccessError::rejected_read(entity, &e))?;
        self.driver.fetch_all(&query).await.map_err(|e| AccessError::fetch_failure(entity, &e))
    }

    async fn guard_matches(&self, entity: Entity, guard: &Guard) -> AccessResult<bool> {
        let statement = sql::exists_statement(entity.table, &guard.column)
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        let params = SqlParams::new().with(guard.column.clone(), guard.value.clone());
        let query = sql::checked(NamedQuery::new(statement, params))
            .map_err(|e| AccessError::rejected_read(entity, &e))?;
        let row = self
            .driver
            .fetch_one(&query)
            .await
            .map_err(|e| AccessError::fetch_failure(entity, &e))?;
        Ok(row.is_some())
    }
}
