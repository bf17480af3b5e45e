//! Structured SQL construction.
//!
//! All non-raw relational operations go through these builders: filters are
//! (column, operator, bound value) objects, table and column names are
//! validated against the identifier character set, and every caller value is
//! bound through named parameters. Free-text SQL is visibly opt-in via
//! `raw_query` only.

use mercata_types::{NamedQuery, QueryError, SqlParams, SqlValue, ensure_identifier};

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Comparison operators available to structured filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare { column: String, op: Comparison, value: SqlValue },
    IsNull { column: String },
    AnyOf { column: String, values: Vec<SqlValue> },
}

/// A structured filter: conjunctive (column, operator, bound value)
/// conditions.
///
/// Rendering produces a `WHERE` body plus the named parameters it binds;
/// column names are validated, values are always bound, never interpolated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// An empty filter, matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    fn compare(
        mut self,
        column: impl Into<String>,
        op: Comparison,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.conditions.push(Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Eq, value)
    }

    /// `column <> value`
    #[must_use]
    pub fn ne(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Ne, value)
    }

    /// `column > value`
    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Gt, value)
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Gte, value)
    }

    /// `column < value`
    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Lt, value)
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Lte, value)
    }

    /// `column LIKE value`
    #[must_use]
    pub fn like(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.compare(column, Comparison::Like, value)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull { column: column.into() });
        self
    }

    /// `column IN (...)`
    #[must_use]
    pub fn any_of<V: Into<SqlValue>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::AnyOf {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render to a `WHERE` body and its bound parameters.
    ///
    /// An empty filter renders to an empty string. Parameter names derive
    /// from column names, suffixed when a column appears more than once.
    pub fn to_sql(&self) -> Result<(String, SqlParams), QueryError> {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut params = SqlParams::new();
        for condition in &self.conditions {
            match condition {
                Condition::Compare { column, op, value } => {
                    ensure_identifier(column)?;
                    let name = allocate_name(&params, column);
                    clauses.push(format!("{column} {} :{name}", op.as_sql()));
                    params.set(name, value.clone());
                },
                Condition::IsNull { column } => {
                    ensure_identifier(column)?;
                    clauses.push(format!("{column} IS NULL"));
                },
                Condition::AnyOf { column, values } => {
                    ensure_identifier(column)?;
                    if values.is_empty() {
                        // An empty membership set matches nothing.
                        clauses.push("1 = 0".to_string());
                        continue;
                    }
                    let base = allocate_list_base(&params, column);
                    let mut markers = Vec::with_capacity(values.len());
                    for (index, value) in values.iter().enumerate() {
                        let name = format!("{base}_{index}");
                        markers.push(format!(":{name}"));
                        params.set(name, value.clone());
                    }
                    clauses.push(format!("{column} IN ({})", markers.join(", ")));
                },
            }
        }
        Ok((clauses.join(" AND "), params))
    }
}

fn allocate_list_base(params: &SqlParams, column: &str) -> String {
    if !params.contains(&format!("{column}_0")) {
        return column.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{column}_{suffix}");
        if !params.contains(&format!("{candidate}_0")) {
            return candidate;
        }
        suffix += 1;
    }
}

fn allocate_name(params: &SqlParams, column: &str) -> String {
    if !params.contains(column) {
        return column.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{column}_{suffix}");
        if !params.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Ranking direction for [`ranked_statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// A common-table-expression prefix for `find`.
///
/// The body is caller-supplied SQL carrying its own named parameters; the CTE
/// name is validated like any identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    name: String,
    body: String,
    params: SqlParams,
}

impl Cte {
    pub fn new(name: impl Into<String>, body: impl Into<String>, params: SqlParams) -> Self {
        Self { name: name.into(), body: body.into(), params }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &SqlParams {
        &self.params
    }
}

// ============================================================================
// SECTION: Statement Builders
// ============================================================================

pub(crate) fn column_list(columns: &[&str]) -> Result<String, QueryError> {
    for column in columns {
        ensure_identifier(column)?;
    }
    Ok(columns.join(", "))
}

/// `SELECT <columns> FROM <table>[ WHERE <filter>]`, optionally prefixed by a
/// CTE.
pub(crate) fn select_statement(
    table: &str,
    columns: &[&str],
    where_body: &str,
    cte: Option<&Cte>,
) -> Result<String, QueryError> {
    ensure_identifier(table)?;
    let columns = column_list(columns)?;
    let mut sql = String::new();
    if let Some(cte) = cte {
        ensure_identifier(&cte.name)?;
        sql.push_str(&format!("WITH {} AS ({}) ", cte.name, cte.body));
    }
    sql.push_str(&format!("SELECT {columns} FROM {table}"));
    if !where_body.is_empty() {
        sql.push_str(&format!(" WHERE {where_body}"));
    }
    Ok(sql)
}

/// `INSERT INTO <table> (<names>) VALUES (:<names>)` from the bound value
/// names.
pub(crate) fn insert_statement(table: &str, values: &SqlParams) -> Result<String, QueryError> {
    ensure_identifier(table)?;
    let mut columns = Vec::with_capacity(values.len());
    let mut markers = Vec::with_capacity(values.len());
    for name in values.names() {
        ensure_identifier(name)?;
        columns.push(name.to_string());
        markers.push(format!(":{name}"));
    }
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        markers.join(", ")
    ))
}

/// `UPDATE <table> SET <col> = :set_<col>, ...[ WHERE <filter>]`.
///
/// Change parameters carry a `set_` prefix so a column can appear in both the
/// SET clause and the filter without a binding collision.
pub(crate) fn update_statement(
    table: &str,
    changes: &SqlParams,
    where_body: &str,
) -> Result<String, QueryError> {
    ensure_identifier(table)?;
    let mut assignments = Vec::with_capacity(changes.len());
    for name in changes.names() {
        ensure_identifier(name)?;
        assignments.push(format!("{name} = :set_{name}"));
    }
    let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
    if !where_body.is_empty() {
        sql.push_str(&format!(" WHERE {where_body}"));
    }
    Ok(sql)
}

/// Copy parameters under a `set_`-style prefix.
pub(crate) fn prefixed_params(prefix: &str, params: &SqlParams) -> SqlParams {
    let mut prefixed = SqlParams::new();
    for (name, value) in params.iter() {
        prefixed.set(format!("{prefix}{name}"), value.clone());
    }
    prefixed
}

/// The windowed "one representative row per partition" statement:
/// `ROW_NUMBER() OVER (PARTITION BY ... ORDER BY ...)` filtered to rank 1.
pub(crate) fn ranked_statement(
    table: &str,
    columns: &[&str],
    partition_by: &str,
    order_by: &str,
    direction: Direction,
    where_body: &str,
) -> Result<String, QueryError> {
    ensure_identifier(table)?;
    ensure_identifier(partition_by)?;
    ensure_identifier(order_by)?;
    let columns = column_list(columns)?;
    let mut inner = format!(
        "SELECT {columns}, ROW_NUMBER() OVER (PARTITION BY {partition_by} ORDER BY {order_by} {}) AS row_rank FROM {table}",
        direction.as_sql()
    );
    if !where_body.is_empty() {
        inner.push_str(&format!(" WHERE {where_body}"));
    }
    Ok(format!("WITH ranked AS ({inner}) SELECT {columns} FROM ranked WHERE row_rank = 1"))
}

/// Multi-row insert with a row-count-sized placeholder block:
/// `VALUES (:a_0, :b_0), (:a_1, :b_1), ...`.
pub(crate) fn bulk_insert_statement(
    table: &str,
    columns: &[&str],
    row_count: usize,
) -> Result<String, QueryError> {
    ensure_identifier(table)?;
    let column_names = column_list(columns)?;
    let mut blocks = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let markers: Vec<String> =
            columns.iter().map(|column| format!(":{column}_{row}")).collect();
        blocks.push(format!("({})", markers.join(", ")));
    }
    Ok(format!("INSERT INTO {table} ({column_names}) VALUES {}", blocks.join(", ")))
}

/// Bounded existence probe.
pub(crate) fn exists_statement(table: &str, id_column: &str) -> Result<String, QueryError> {
    ensure_identifier(table)?;
    ensure_identifier(id_column)?;
    Ok(format!("SELECT 1 FROM {table} WHERE {id_column} = :{id_column} LIMIT 1"))
}

/// Validate a query's placeholders against its bindings before dispatch.
pub(crate) fn checked(query: NamedQuery) -> Result<NamedQuery, QueryError> {
    query.validate()?;
    Ok(query)
}
