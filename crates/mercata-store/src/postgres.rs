//! Postgres SQL driver backed by `sqlx`.
//!
//! Translates `:name` placeholders into positional `$n` bindings, binds
//! [`SqlValue`]s, and decodes result rows generically into [`Record`]s.
//! Available behind the `postgres` feature.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use mercata_types::{NamedQuery, Record, SqlValue};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::{Column, Row};
use uuid::Uuid;

use crate::{SqlDriver, StorageError, StorageResult};

/// Postgres error code for an undefined table.
const UNDEFINED_TABLE: &str = "42P01";

/// A connection-pooled Postgres driver.
pub struct PostgresDriver {
    pool: PgPool,
}

impl PostgresDriver {
    /// Wrap an already-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to the given database URL.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let pool =
            PgPool::connect(url).await.map_err(|e| StorageError::connection(e.to_string()))?;
        Ok(Self { pool })
    }

    fn prepare(query: &NamedQuery) -> (String, Vec<SqlValue>) {
        let (sql, names) = to_positional(query.sql());
        let values = names
            .iter()
            .map(|name| query.params().get(name).cloned().unwrap_or(SqlValue::Null))
            .collect();
        (sql, values)
    }
}

/// Rewrite `:name` placeholders as `$n`, returning the rewritten SQL and the
/// parameter names in positional order. Casts and quoted literals pass
/// through untouched.
///
/// Only placeholder spans are rewritten; everything else is copied verbatim
/// as string slices, so non-ASCII text in literals or identifiers survives
/// intact. The byte walk is UTF-8 safe because every boundary it acts on
/// (`'`, `:`, identifier bytes) is ASCII and no continuation byte matches
/// them.
fn to_positional(sql: &str) -> (String, Vec<String>) {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut in_string = false;
    // Start of the pending verbatim segment.
    let mut plain = 0;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\'' {
            in_string = !in_string;
            i += 1;
            continue;
        }
        if in_string || c != b':' {
            i += 1;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i + 1] == b':' {
            i += 2;
            while i < bytes.len() && is_ident_byte(bytes[i]) {
                i += 1;
            }
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && is_ident_byte(bytes[end]) {
            end += 1;
        }
        if end > start && !bytes[start].is_ascii_digit() {
            out.push_str(&sql[plain..i]);
            let name = &sql[start..end];
            let position = match names.iter().position(|n| n == name) {
                Some(p) => p,
                None => {
                    names.push(name.to_string());
                    names.len() - 1
                },
            };
            out.push_str(&format!("${}", position + 1));
            plain = end;
        }
        i = end.max(i + 1);
    }
    out.push_str(&sql[plain..]);
    (out, names)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Uuid(u) => query.bind(u),
        SqlValue::Timestamp(t) => query.bind(t),
        SqlValue::Bytes(b) => query.bind(b),
    }
}

/// Decode one column into a JSON value, probing the common Postgres scalar
/// types in order.
fn decode_column(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(Value::Null, Value::from);
    }
    if let Ok(v) = row.try_get::<Option<Uuid>, _>(index) {
        return v.map_or(Value::Null, |u| Value::String(u.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(index) {
        return v.map_or(Value::Null, |t| Value::String(t.to_rfc3339()));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::String);
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(index) {
        return v.unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map_or(Value::Null, |b| Value::String(BASE64.encode(b)));
    }
    Value::Null
}

fn row_to_record(row: &PgRow) -> Record {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), decode_column(row, index));
    }
    record
}

fn map_sqlx_error(error: sqlx::Error) -> StorageError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE) => {
            StorageError::CollectionNotFound(db.message().to_string())
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Connection(error.to_string())
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StorageError::Serialization(error.to_string())
        },
        _ => StorageError::Execution(error.to_string()),
    }
}

#[async_trait]
impl SqlDriver for PostgresDriver {
    async fn fetch_one(&self, query: &NamedQuery) -> StorageResult<Option<Record>> {
        let (sql, values) = Self::prepare(query);
        let mut prepared = sqlx::query(&sql);
        for value in values {
            prepared = bind_value(prepared, value);
        }
        let row = prepared.fetch_optional(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn fetch_all(&self, query: &NamedQuery) -> StorageResult<Vec<Record>> {
        let (sql, values) = Self::prepare(query);
        let mut prepared = sqlx::query(&sql);
        for value in values {
            prepared = bind_value(prepared, value);
        }
        let rows = prepared.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn execute(&self, query: &NamedQuery) -> StorageResult<u64> {
        let (sql, values) = Self::prepare(query);
        let mut prepared = sqlx::query(&sql);
        for value in values {
            prepared = bind_value(prepared, value);
        }
        let done = prepared.execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(done.rows_affected())
    }
}
