//! SQLx-based execution backend.
//!
//! Runs validated SQL over `sqlx::AnyPool` (PostgreSQL, MySQL, SQLite).
//! The OFFSET/FETCH paging idiom the renderer emits is ANSI SQL, so
//! development and CI can execute against these engines; a production SQL
//! Server deployment plugs its own driver in behind
//! [`super::ExecutionBackend`].

use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Column, Row, TypeInfo};
use std::time::Duration;

use super::{ColumnMeta, ExecutionBackend, ExecutionError, ExecutionResult};

pub struct SqlxBackend {
    pool: AnyPool,
    /// Backend-side row cap, independent of the validator's static check.
    max_rows: usize,
    statement_timeout: Duration,
}

impl SqlxBackend {
    pub async fn connect(
        url: &str,
        max_rows: u32,
        statement_timeout: Duration,
    ) -> Result<Self, ExecutionError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPool::connect(url)
            .await
            .map_err(|err| ExecutionError::Database(err.to_string()))?;
        Ok(Self {
            pool,
            max_rows: max_rows as usize,
            statement_timeout,
        })
    }
}

#[async_trait]
impl ExecutionBackend for SqlxBackend {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError> {
        let fetch = sqlx::query(sql).fetch_all(&self.pool);
        let rows = tokio::time::timeout(self.statement_timeout, fetch)
            .await
            .map_err(|_| ExecutionError::Timeout(self.statement_timeout.as_secs()))?
            .map_err(|err| ExecutionError::Database(err.to_string()))?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| ColumnMeta {
                        name: column.name().to_string(),
                        type_name: column.type_info().name().to_lowercase(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let has_more = rows.len() > self.max_rows;
        let data: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .take(self.max_rows)
            .map(row_to_values)
            .collect();

        Ok(ExecutionResult {
            row_count: data.len(),
            columns,
            rows: data,
            has_more,
        })
    }
}

/// Decodes a row column-by-column into JSON values, falling back through
/// the types the Any driver can produce.
fn row_to_values(row: &AnyRow) -> Vec<serde_json::Value> {
    (0..row.columns().len())
        .map(|index| {
            if let Ok(value) = row.try_get::<i64, _>(index) {
                return serde_json::Value::from(value);
            }
            if let Ok(value) = row.try_get::<f64, _>(index) {
                return serde_json::Value::from(value);
            }
            if let Ok(value) = row.try_get::<bool, _>(index) {
                return serde_json::Value::from(value);
            }
            if let Ok(value) = row.try_get::<String, _>(index) {
                return serde_json::Value::from(value);
            }
            serde_json::Value::Null
        })
        .collect()
}
