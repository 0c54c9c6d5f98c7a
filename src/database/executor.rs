//! Query executor: raw SQL in, rows as ordered field -> value mappings out.
//!
//! All store access goes through the [`SqlExecutor`] trait so the
//! repositories and the aggregation service can be exercised against an
//! in-memory mock. The production implementation, [`PgExecutor`], wraps a
//! `sqlx` Postgres pool and translates every driver failure into
//! [`StoreError`]; no query-specific error handling happens here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};
use tracing::warn;

use crate::error::StoreError;

/// A single result row, keyed by column name in select order.
pub type Row = Map<String, Value>;

/// Positional query parameter, bound as `$1`, `$2`, ... in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

/// Store access contract used by the repositories.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a query and return every matching row.
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, StoreError>;

    /// Run a query and return the first matching row, if any.
    async fn fetch_one(&self, sql: &str, params: &[SqlParam]) -> Result<Option<Row>, StoreError>;

    /// Run a write statement and commit it.
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<(), StoreError>;
}

/// Postgres-backed executor over a shared connection pool.
#[derive(Clone, Debug)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, StoreError> {
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_one(&self, sql: &str, params: &[SqlParam]) -> Result<Option<Row>, StoreError> {
        let row = bind_params(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_json))
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<(), StoreError> {
        bind_params(sqlx::query(sql), params)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn bind_params<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    let mut query = query;
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::Int(value) => query.bind(*value),
        };
    }
    query
}

/// Convert one driver row into a JSON field mapping.
///
/// Column types outside the expected set decode as text when possible and
/// degrade to `null` otherwise; missing detail columns must never abort an
/// aggregation, so this conversion is total.
fn row_to_json(row: &PgRow) -> Row {
    let mut mapping = Map::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(v as i64)),
            "INT4" => row
                .try_get::<Option<i32>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(v as i64)),
            "INT8" => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .flatten()
                .map(Value::from),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(v as f64)),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .flatten()
                .map(Value::from),
            "BOOL" => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map(Value::from),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx).ok().flatten(),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(v.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::from(v.format("%Y-%m-%dT%H:%M:%S").to_string())),
            _ => row
                .try_get::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map(Value::from),
        };
        mapping.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }
    mapping
}

/// Project a raw row into a typed structure with all-optional fields.
///
/// Projection happens exactly once, at the repository boundary. A row whose
/// field types drifted from the schema contract projects to the default
/// (all-`None`) value rather than failing the fetch.
pub(crate) fn project_row<T>(row: Row) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value(Value::Object(row)) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "row failed typed projection, using empty record");
            T::default()
        }
    }
}
