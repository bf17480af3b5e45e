//! Named query and SQL value types.
//!
//! A [`NamedQuery`] pairs a SQL template containing `:name` placeholders with
//! the [`SqlParams`] mapping that binds them. Every placeholder referenced in
//! the template must have a corresponding bound value; [`NamedQuery::validate`]
//! enforces this before a query reaches a driver.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Errors raised while constructing or validating queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A placeholder referenced in the template has no bound value.
    #[error("placeholder :{0} has no bound value")]
    UnboundPlaceholder(String),

    /// A table or column name contains characters outside the identifier set.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// A scalar value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Render this value as JSON, for records and for test assertions.
    ///
    /// Byte values are rendered as base64 strings, matching the document
    /// identifier codec.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(b) => Value::Bool(*b),
            SqlValue::Int(i) => Value::from(*i),
            SqlValue::Float(f) => Value::from(*f),
            SqlValue::Text(s) => Value::String(s.clone()),
            SqlValue::Uuid(u) => Value::String(u.to_string()),
            SqlValue::Timestamp(t) => Value::String(t.to_rfc3339()),
            SqlValue::Bytes(b) => Value::String(BASE64.encode(b)),
        }
    }

    /// Build a value from its JSON representation.
    ///
    /// Numbers become `Int` when integral, otherwise `Float`; composite JSON
    /// values are rendered as text. Strings stay text — callers that know a
    /// column holds a UUID or timestamp convert explicitly.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::Int(i)
                } else {
                    SqlValue::Float(n.as_f64().unwrap_or(0.0))
                }
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}

/// An ordered named-parameter set.
///
/// Parameter order is deterministic (sorted by name), so generated queries and
/// recorded test expectations are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlParams(BTreeMap<String, SqlValue>);

impl SqlParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value, chainable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Bind a value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a bound value.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.0.get(name)
    }

    /// Whether a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterate bound names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate (name, value) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SqlValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Absorb all bindings from another set; `other` wins on name collisions.
    pub fn merge(&mut self, other: SqlParams) {
        self.0.extend(other.0);
    }

    /// Consume the set, yielding the bound values in name order.
    pub fn into_values(self) -> Vec<SqlValue> {
        self.0.into_values().collect()
    }

    /// Build a parameter set from a flat record, converting each JSON value.
    pub fn from_record(record: &crate::Record) -> Self {
        let mut params = Self::new();
        for (name, value) in record {
            params.set(name.clone(), SqlValue::from_json(value));
        }
        params
    }
}

/// A SQL template paired with its named-parameter bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQuery {
    sql: String,
    params: SqlParams,
}

impl NamedQuery {
    /// Create a named query from a template and its bindings.
    pub fn new(sql: impl Into<String>, params: SqlParams) -> Self {
        Self { sql: sql.into(), params }
    }

    /// The SQL template text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters.
    pub fn params(&self) -> &SqlParams {
        &self.params
    }

    /// The distinct placeholder names referenced by the template, in first
    /// appearance order.
    ///
    /// A placeholder is `:` followed by an identifier. Postgres-style `::type`
    /// casts and text inside single-quoted literals are not placeholders.
    pub fn placeholders(&self) -> Vec<String> {
        let bytes = self.sql.as_bytes();
        let mut names: Vec<String> = Vec::new();
        let mut in_string = false;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            if c == b'\'' {
                in_string = !in_string;
                i += 1;
                continue;
            }
            if in_string {
                i += 1;
                continue;
            }
            if c == b':' {
                // A double colon is a cast, not a placeholder.
                if i + 1 < bytes.len() && bytes[i + 1] == b':' {
                    i += 2;
                    // Skip the cast target so its name is not read as a placeholder.
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
                    let name = String::from_utf8_lossy(&bytes[start..end]).into_owned();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                i = end;
                continue;
            }
            i += 1;
        }
        names
    }

    /// Verify that every referenced placeholder has a bound value.
    pub fn validate(&self) -> Result<(), QueryError> {
        for name in self.placeholders() {
            if !self.params.contains(&name) {
                return Err(QueryError::UnboundPlaceholder(name));
            }
        }
        Ok(())
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Verify that a table or column name stays within the identifier character
/// set, so it can be spliced into generated SQL without quoting.
pub fn ensure_identifier(name: &str) -> Result<(), QueryError> {
    let mut chars = name.chars();
    let valid_head = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_head && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_in_order() {
        let query = NamedQuery::new(
            "SELECT id FROM supplier_business WHERE region_code = :region AND active = :active",
            SqlParams::new(),
        );
        assert_eq!(query.placeholders(), vec!["region".to_string(), "active".to_string()]);
    }

    #[test]
    fn test_placeholders_deduplicated() {
        let query =
            NamedQuery::new("SELECT :id AS a, :id AS b FROM price_quote", SqlParams::new());
        assert_eq!(query.placeholders(), vec!["id".to_string()]);
    }

    #[test]
    fn test_cast_is_not_a_placeholder() {
        let query = NamedQuery::new(
            "SELECT id::text FROM supplier_business WHERE id = :id",
            SqlParams::new(),
        );
        assert_eq!(query.placeholders(), vec!["id".to_string()]);
    }

    #[test]
    fn test_string_literal_is_not_a_placeholder() {
        let query = NamedQuery::new(
            "SELECT ':not_a_param' AS label FROM price_quote WHERE currency = :currency",
            SqlParams::new(),
        );
        assert_eq!(query.placeholders(), vec!["currency".to_string()]);
    }

    #[test]
    fn test_validate_accepts_fully_bound_query() {
        let params = SqlParams::new().with("region", "EU-WEST").with("active", true);
        let query = NamedQuery::new(
            "SELECT id FROM supplier_business WHERE region_code = :region AND active = :active",
            params,
        );
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unbound_placeholder() {
        let params = SqlParams::new().with("region", "EU-WEST");
        let query = NamedQuery::new(
            "SELECT id FROM supplier_business WHERE region_code = :region AND active = :active",
            params,
        );
        assert_eq!(query.validate(), Err(QueryError::UnboundPlaceholder("active".to_string())));
    }

    #[test]
    fn test_params_are_ordered_by_name() {
        let params = SqlParams::new().with("b", 1i64).with("a", 2i64);
        let names: Vec<&str> = params.names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_params_merge_overwrites() {
        let mut params = SqlParams::new().with("id", 1i64);
        params.merge(SqlParams::new().with("id", 2i64).with("name", "Acme"));
        assert_eq!(params.get("id"), Some(&SqlValue::Int(2)));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_sql_value_from_json() {
        assert_eq!(SqlValue::from_json(&Value::Null), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&serde_json::json!(7)), SqlValue::Int(7));
        assert_eq!(SqlValue::from_json(&serde_json::json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(SqlValue::from_json(&serde_json::json!("x")), SqlValue::Text("x".to_string()));
    }

    #[test]
    fn test_sql_value_option_conversion() {
        let some: SqlValue = Some("tel").into();
        assert_eq!(some, SqlValue::Text("tel".to_string()));
        let none: SqlValue = Option::<String>::None.into();
        assert_eq!(none, SqlValue::Null);
    }

    #[test]
    fn test_ensure_identifier() {
        assert!(ensure_identifier("supplier_business").is_ok());
        assert!(ensure_identifier("_hidden").is_ok());
        assert!(ensure_identifier("col2").is_ok());
        assert!(ensure_identifier("1col").is_err());
        assert!(ensure_identifier("drop table; --").is_err());
        assert!(ensure_identifier("").is_err());
    }
}
