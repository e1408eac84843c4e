//! Public types: the query representation and validation results.

mod common;
mod query;

pub use common::{Issue, IssueCode, Severity, ValidationResult};
pub use query::{
    AggregateFn, ColumnRef, Connector, FilterOp, FilterPredicate, JoinKind, JoinSpec, Paging,
    QuerySpec, SortDirection, SortKey, TableRef,
};
