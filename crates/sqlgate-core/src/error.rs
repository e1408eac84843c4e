//! Error types for the query representation and renderer.
//!
//! # Error Handling Strategy
//!
//! Two complementary patterns:
//!
//! - [`SpecError`]: fatal structural violations in a [`crate::QuerySpec`]
//!   (undeclared aliases, missing paging anchors). Returned as
//!   `Result<_, SpecError>` from [`crate::QuerySpec::check`] and
//!   [`crate::render`]; a rejected spec never produces SQL text.
//!
//! - [`crate::types::Issue`]: findings about SQL *text*, collected by the
//!   validator and returned as values inside a
//!   [`crate::types::ValidationResult`]. The validator is total: malformed
//!   input yields an `E_PARSE_ERROR` issue, never an `Err` and never a
//!   panic, so callers always receive maximal feedback in one pass.

use thiserror::Error;

/// Structural violation in a query representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("query representation declares no tables")]
    NoTables,

    #[error("query representation projects no columns")]
    NoColumns,

    #[error("alias `{alias}` referenced in {context} is not declared in the table list")]
    UnknownAlias {
        alias: String,
        context: &'static str,
    },

    #[error("alias `{0}` is declared more than once")]
    DuplicateAlias(String),

    #[error("paging requires at least one ORDER BY key")]
    MissingOrderBy,

    #[error("paging fetch size must be at least 1")]
    ZeroFetch,
}
