pub mod allowlist;
pub mod error;
pub mod parser;
pub mod render;
pub mod types;
pub mod validator;

// Re-export main types and functions
pub use allowlist::Allowlist;
pub use error::SpecError;
pub use parser::parse_sql;
pub use render::render;
pub use validator::validate;

// Re-export types explicitly
pub use types::{
    AggregateFn,
    ColumnRef,
    Connector,
    FilterOp,
    FilterPredicate,
    Issue,
    IssueCode,
    JoinKind,
    JoinSpec,
    Paging,
    QuerySpec,
    Severity,
    SortDirection,
    SortKey,
    TableRef,
    ValidationResult,
};
