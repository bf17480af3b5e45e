//! Recording SQL driver for testing and development.
//!
//! Records every issued query with its bound parameters and replays queued
//! responses, so access-layer query construction can be verified without a
//! live database. Unqueued calls fall back to benign defaults: no row, no
//! rows, one affected row.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use mercata_types::{NamedQuery, Record, SqlParams};

use crate::{SqlDriver, StorageError, StorageResult};

/// One recorded query dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedQuery {
    pub sql: String,
    pub params: SqlParams,
}

#[derive(Default)]
struct RecorderState {
    issued: Vec<IssuedQuery>,
    one: VecDeque<StorageResult<Option<Record>>>,
    all: VecDeque<StorageResult<Vec<Record>>>,
    execute: VecDeque<StorageResult<u64>>,
}

/// A scripted [`SqlDriver`] that records what the access layer sends it.
#[derive(Default)]
pub struct RecordingSqlDriver {
    state: Mutex<RecorderState>,
}

impl RecordingSqlDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `fetch_one` response.
    pub fn queue_one(&self, row: Option<Record>) {
        self.lock().one.push_back(Ok(row));
    }

    /// Queue the next `fetch_all` response.
    pub fn queue_all(&self, rows: Vec<Record>) {
        self.lock().all.push_back(Ok(rows));
    }

    /// Queue the next `execute` response.
    pub fn queue_execute(&self, affected: u64) {
        self.lock().execute.push_back(Ok(affected));
    }

    /// Queue a failure for the next `fetch_one` call.
    pub fn fail_one(&self, error: StorageError) {
        self.lock().one.push_back(Err(error));
    }

    /// Queue a failure for the next `fetch_all` call.
    pub fn fail_all(&self, error: StorageError) {
        self.lock().all.push_back(Err(error));
    }

    /// Queue a failure for the next `execute` call.
    pub fn fail_execute(&self, error: StorageError) {
        self.lock().execute.push_back(Err(error));
    }

    /// Every query issued so far, in dispatch order.
    pub fn issued(&self) -> Vec<IssuedQuery> {
        self.lock().issued.clone()
    }

    /// Number of queries issued so far.
    pub fn issued_count(&self) -> usize {
        self.lock().issued.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        // A poisoned lock only happens when a test already panicked.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, query: &NamedQuery) {
        self.lock()
            .issued
            .push(IssuedQuery { sql: query.sql().to_string(), params: query.params().clone() });
    }
}

#[async_trait]
impl SqlDriver for RecordingSqlDriver {
    async fn fetch_one(&self, query: &NamedQuery) -> StorageResult<Option<Record>> {
        self.record(query);
        self.lock().one.pop_front().unwrap_or(Ok(None))
    }

    async fn fetch_all(&self, query: &NamedQuery) -> StorageResult<Vec<Record>> {
        self.record(query);
        self.lock().all.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn execute(&self, query: &NamedQuery) -> StorageResult<u64> {
        self.record(query);
        self.lock().execute.pop_front().unwrap_or(Ok(1))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_records_issued_queries() {
        let driver = RecordingSqlDriver::new();
        let params = SqlParams::new().with("id", 7i64);
        let query = NamedQuery::new("SELECT id FROM price_quote WHERE id = :id", params.clone());

        driver.fetch_one(&query).await.unwrap();

        let issued = driver.issued();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].sql, "SELECT id FROM price_quote WHERE id = :id");
        assert_eq!(issued[0].params, params);
    }

    #[tokio::test]
    async fn test_replays_queued_responses_in_order() {
        let driver = RecordingSqlDriver::new();
        let row = mercata_types::record_from_value(json!({"id": 1})).unwrap();
        driver.queue_one(Some(row.clone()));
        driver.queue_one(None);

        let query = NamedQuery::new("SELECT 1", SqlParams::new());
        assert_eq!(driver.fetch_one(&query).await.unwrap(), Some(row));
        assert_eq!(driver.fetch_one(&query).await.unwrap(), None);
        // Unqueued calls default to no row.
        assert_eq!(driver.fetch_one(&query).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_queued_failures_surface() {
        let driver = RecordingSqlDriver::new();
        driver.fail_execute(StorageError::execution("deadlock"));

        let query = NamedQuery::new("UPDATE t SET a = :a", SqlParams::new().with("a", 1i64));
        let result = driver.execute(&query).await;
        assert!(matches!(result, Err(StorageError::Execution(_))));

        // Defaults resume after the queue drains.
        assert_eq!(driver.execute(&query).await.unwrap(), 1);
    }
}
