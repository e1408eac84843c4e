//! Execution backend seam.
//!
//! Executing validated SQL is an external collaborator concern: the backend
//! enforces its own statement timeout and row cap independently of the
//! static gate (defense in depth). The gate never hands a backend anything
//! that did not pass validation.

#[cfg(feature = "executor")]
mod sqlx_backend;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "executor")]
pub use sqlx_backend::SqlxBackend;

/// Column metadata in the result shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Rows from one validated query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
    /// True when the backend's own cap truncated the result.
    pub has_more: bool,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("statement timed out after {0} seconds")]
    Timeout(u64),

    #[error("database error: {0}")]
    Database(String),
}

/// Runs validator-approved SQL and returns tabular results.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, ExecutionError>;
}
