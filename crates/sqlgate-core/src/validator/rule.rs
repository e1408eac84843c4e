//! Check rule trait and context for the structural validation stages.

use sqlparser::ast::Query;

use crate::allowlist::Allowlist;
use crate::types::{Issue, IssueCode};

use super::objects::ObjectRef;

/// Context provided to structural checks.
pub struct CheckContext<'a> {
    /// Objects referenced by the statement, in source order.
    pub objects: &'a [ObjectRef],
    /// The configured allowlist.
    pub allowlist: &'a Allowlist,
    /// Maximum admissible fetch size.
    pub max_rows: u32,
}

/// A single structural check over the parsed query.
///
/// Checks run in a fixed pipeline order and accumulate issues; none of them
/// short-circuits, so the caller gets maximal feedback in one pass.
pub trait CheckRule: Send + Sync {
    /// The issue code this check reports.
    fn code(&self) -> IssueCode;

    /// Short human-readable name.
    fn name(&self) -> &'static str;

    /// Checks the query and returns any findings.
    fn check(&self, query: &Query, ctx: &CheckContext) -> Vec<Issue>;
}
