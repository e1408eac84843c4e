//! Issue and validation-result types shared across the crate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Machine-readable codes for validation findings.
///
/// The serialized names are a stable, externally visible contract: the HTTP
/// API returns them verbatim and the repair loop derives one generator
/// constraint per distinct code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum IssueCode {
    /// Empty or whitespace-only input after comment stripping.
    #[serde(rename = "E_EMPTY_QUERY")]
    EmptyQuery,
    /// More than one non-empty statement.
    #[serde(rename = "E_MULTI_STMT")]
    MultiStatement,
    /// The statement is not a SELECT (leading CTEs are allowed).
    #[serde(rename = "E_NOT_SELECT")]
    NotSelect,
    /// A write/DDL/administrative keyword at statement level.
    #[serde(rename = "E_FORBIDDEN_OPERATION")]
    ForbiddenOperation,
    /// EXEC / EXECUTE / sp_executesql dynamic-SQL constructs.
    #[serde(rename = "E_DYNAMIC_SQL")]
    DynamicSql,
    /// The statement could not be parsed.
    #[serde(rename = "E_PARSE_ERROR")]
    ParseError,
    /// A referenced object is not in the allowlist, or is unqualified.
    #[serde(rename = "E_NOT_ALLOWLIST")]
    NotAllowlisted,
    /// A temporary-table reference or target.
    #[serde(rename = "E_TEMP_TABLE")]
    TempTable,
    /// A system schema or catalog object.
    #[serde(rename = "E_SYSTEM_OBJECT")]
    SystemObject,
    /// A database-qualified (three/four-part) object name.
    #[serde(rename = "E_CROSS_DB")]
    CrossDatabase,
    /// Row-limiting without an ORDER BY clause.
    #[serde(rename = "E_NO_ORDER_BY")]
    NoOrderBy,
    /// An unqualified column where more than one table alias is in scope.
    #[serde(rename = "E_AMBIGUOUS_COLUMN")]
    AmbiguousColumn,
    /// A non-aggregated projection column missing from GROUP BY.
    #[serde(rename = "E_AGGREGATION")]
    Aggregation,
    /// An explicit fetch size above the configured row cap.
    #[serde(rename = "E_MAX_ROWS")]
    MaxRows,
    /// The candidate generator timed out (orchestrator-synthesized).
    #[serde(rename = "E_GENERATION_TIMEOUT")]
    GenerationTimeout,
    /// The candidate generator failed (orchestrator-synthesized).
    #[serde(rename = "E_GENERATION_FAILED")]
    GenerationFailed,
    /// CROSS JOIN with no WHERE restriction (advisory).
    #[serde(rename = "W_CROSS_JOIN")]
    CrossJoin,
}

impl IssueCode {
    /// Stable wire name of the code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "E_EMPTY_QUERY",
            Self::MultiStatement => "E_MULTI_STMT",
            Self::NotSelect => "E_NOT_SELECT",
            Self::ForbiddenOperation => "E_FORBIDDEN_OPERATION",
            Self::DynamicSql => "E_DYNAMIC_SQL",
            Self::ParseError => "E_PARSE_ERROR",
            Self::NotAllowlisted => "E_NOT_ALLOWLIST",
            Self::TempTable => "E_TEMP_TABLE",
            Self::SystemObject => "E_SYSTEM_OBJECT",
            Self::CrossDatabase => "E_CROSS_DB",
            Self::NoOrderBy => "E_NO_ORDER_BY",
            Self::AmbiguousColumn => "E_AMBIGUOUS_COLUMN",
            Self::Aggregation => "E_AGGREGATION",
            Self::MaxRows => "E_MAX_ROWS",
            Self::GenerationTimeout => "E_GENERATION_TIMEOUT",
            Self::GenerationFailed => "E_GENERATION_FAILED",
            Self::CrossJoin => "W_CROSS_JOIN",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Severity level
    pub severity: Severity,

    /// Machine-readable issue code
    pub code: IssueCode,

    /// Human-readable message
    pub message: String,
}

impl Issue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

/// Outcome of validating a single SQL string.
///
/// Produced once per [`crate::validator::validate`] call and never mutated.
/// Equal inputs produce equal results, including issue ordering, which the
/// repair loop relies on for reproducible prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True iff no issue carries [`Severity::Error`].
    pub ok: bool,

    /// Fully-qualified table/view names referenced by the statement.
    pub objects: BTreeSet<String>,

    /// Findings in pipeline-stage order.
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// Assembles a result, deriving `ok` from the issue severities.
    pub fn from_issues(objects: BTreeSet<String>, issues: Vec<Issue>) -> Self {
        let ok = !issues.iter().any(|i| i.severity == Severity::Error);
        Self {
            ok,
            objects,
            issues,
        }
    }

    /// Returns true if any finding carries the given code.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}
