//! Relational query service.
//!
//! Executes generated SQL against Postgres and returns rows with normalized
//! scalar types: NUMERIC becomes a JSON number, date/time values become
//! ISO-8601 strings, everything else passes through unchanged. Database error
//! messages are preserved verbatim so the analytical node can classify them
//! by substring.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bigdecimal::ToPrimitive;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo};

use querymind_core::Row;

/// Errors from the relational query service.
///
/// `Execution` carries the database's own message content; callers
/// distinguish syntax errors from missing relations by inspecting it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("query execution failed: {0}")]
    Execution(String),
    #[error("database connection failed: {0}")]
    Connection(String),
}

impl QueryError {
    /// The underlying message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            QueryError::Execution(m) | QueryError::Connection(m) => m,
        }
    }
}

impl From<QueryError> for querymind_core::QuerymindError {
    fn from(err: QueryError) -> Self {
        querymind_core::QuerymindError::Query(err.to_string())
    }
}

/// A service that executes query strings against the dataset.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Human-readable column/type listing grouped by table.
    async fn fetch_schema(&self) -> Result<String, QueryError>;

    /// Execute a read query and return normalized rows.
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError>;
}

// =============================================================================
// Postgres adapter
// =============================================================================

/// sqlx-backed Postgres implementation of [`RelationalStore`].
pub struct SqlStore {
    pool: PgPool,
}

impl SqlStore {
    /// Connect a new pool to the given database URL.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, QueryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationalStore for SqlStore {
    async fn fetch_schema(&self) -> Result<String, QueryError> {
        let rows = sqlx::query(
            r#"
            SELECT table_name, column_name, data_type, is_nullable,
                   character_maximum_length
            FROM information_schema.columns
            WHERE table_schema = 'public'
            ORDER BY table_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut tables: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in &rows {
            let table: String = row.try_get("table_name").unwrap_or_default();
            let column: String = row.try_get("column_name").unwrap_or_default();
            let data_type: String = row.try_get("data_type").unwrap_or_default();
            let nullable: String = row.try_get("is_nullable").unwrap_or_default();
            let max_len: Option<i32> = row.try_get("character_maximum_length").ok().flatten();

            let mut type_str = data_type;
            if let Some(n) = max_len {
                type_str.push_str(&format!("({})", n));
            }
            let null_str = if nullable == "YES" { "NULL" } else { "NOT NULL" };
            tables
                .entry(table)
                .or_default()
                .push(format!("  - {}: {} {}", column, type_str, null_str));
        }

        let mut schema = String::from("Database Schema:\n\n");
        for (table, columns) in tables {
            schema.push_str(&format!("Table: {}\n", table));
            for col in columns {
                schema.push_str(&col);
                schema.push('\n');
            }
            schema.push('\n');
        }
        Ok(schema)
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.iter().map(normalize_row).collect())
    }
}

fn map_sqlx_error(err: sqlx::Error) -> QueryError {
    match err {
        // The database's own message carries the "syntax error" / "does not
        // exist" content the analytical node classifies on.
        sqlx::Error::Database(db) => QueryError::Execution(db.message().to_string()),
        other => QueryError::Connection(other.to_string()),
    }
}

/// Decode one Postgres row into a column-name → JSON-value map.
///
/// Undecodable values become JSON null rather than failing the whole result.
fn normalize_row(row: &PgRow) -> Row {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), normalize_value(row, i));
    }
    out
}

fn normalize_value(row: &PgRow, i: usize) -> Value {
    let type_name = row.columns()[i].type_info().name().to_uppercase();
    match type_name.as_str() {
        "INT2" => opt_number(row.try_get::<Option<i16>, _>(i).ok().flatten().map(i64::from)),
        "INT4" => opt_number(row.try_get::<Option<i32>, _>(i).ok().flatten().map(i64::from)),
        "INT8" => opt_number(row.try_get::<Option<i64>, _>(i).ok().flatten()),
        "FLOAT4" => opt_float(
            row.try_get::<Option<f32>, _>(i)
                .ok()
                .flatten()
                .map(f64::from),
        ),
        "FLOAT8" => opt_float(row.try_get::<Option<f64>, _>(i).ok().flatten()),
        "NUMERIC" => opt_float(
            row.try_get::<Option<bigdecimal::BigDecimal>, _>(i)
                .ok()
                .flatten()
                .and_then(|d| d.to_f64()),
        ),
        "BOOL" => row
            .try_get::<Option<bool>, _>(i)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)
            .ok()
            .flatten()
            .map(|t| Value::String(t.to_rfc3339()))
            .unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(i)
            .ok()
            .flatten()
            .map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(i)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(i)
            .ok()
            .flatten()
            .map(|u| Value::String(u.to_string()))
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(i)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn opt_number(v: Option<i64>) -> Value {
    v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null)
}

fn opt_float(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        let err = QueryError::Execution("syntax error at or near \"SELEC\"".into());
        assert!(err.to_string().starts_with("query execution failed"));
        assert!(err.message().contains("syntax error"));
    }

    #[test]
    fn test_query_error_message_strips_prefix() {
        let err = QueryError::Connection("pool timed out".into());
        assert_eq!(err.message(), "pool timed out");
    }

    #[test]
    fn test_opt_number() {
        assert_eq!(opt_number(Some(42)), Value::Number(42.into()));
        assert_eq!(opt_number(None), Value::Null);
    }

    #[test]
    fn test_opt_float() {
        assert_eq!(opt_float(Some(4.5)), serde_json::json!(4.5));
        assert_eq!(opt_float(None), Value::Null);
        // NaN has no JSON representation.
        assert_eq!(opt_float(Some(f64::NAN)), Value::Null);
    }
}
