//! The static SQL safety gate.
//!
//! [`validate`] is a pure, total function: it never panics and never returns
//! an error for malformed input. Every finding, including parse failures,
//! comes back as an [`Issue`] inside the [`ValidationResult`]. It holds no
//! state and reads only the injected allowlist, so any number of callers may
//! run it concurrently.
//!
//! Pipeline order, which is also the issue ordering contract:
//!
//! 1. normalize (comment stripping) and the empty-input check
//! 2. statement count
//! 3. statement kind, banned operations, dynamic SQL, temp-table references
//! 4. parse; on failure, `E_PARSE_ERROR` ends the structural stages
//! 5. structural checks in [`checks::all_checks`] order: SELECT INTO,
//!    allowlist, system objects, cross-database, determinism, ambiguity,
//!    aggregation, row cap, cross-join advisory
//!
//! Validating the same input twice yields byte-identical results.

mod keywords;
pub mod normalize;
mod objects;
pub mod rule;

pub mod checks;

use std::collections::BTreeSet;

use sqlparser::ast::Statement;

use crate::allowlist::Allowlist;
use crate::parser::parse_sql;
use crate::types::{Issue, IssueCode, ValidationResult};

use keywords::check_keywords;
use normalize::{count_statements, normalize};
use objects::collect_objects;
use rule::CheckContext;

pub use objects::ObjectRef;

/// Validates one SQL string against the read-only policy.
pub fn validate(sql: &str, allowlist: &Allowlist, max_rows: u32) -> ValidationResult {
    let normalized = normalize(sql);

    let statement_count = count_statements(&normalized.masked);
    if statement_count == 0 {
        return ValidationResult::from_issues(
            BTreeSet::new(),
            vec![Issue::error(
                IssueCode::EmptyQuery,
                "SQL query cannot be empty",
            )],
        );
    }

    let mut issues = Vec::new();

    if statement_count > 1 {
        issues.push(Issue::error(
            IssueCode::MultiStatement,
            "Multiple statements are not allowed; submit a single SELECT",
        ));
    }

    issues.extend(check_keywords(&normalized.masked));

    let mut objects = BTreeSet::new();

    match parse_sql(&normalized.stripped) {
        Err(err) => {
            issues.push(Issue::error(
                IssueCode::ParseError,
                format!("SQL could not be parsed: {err}"),
            ));
        }
        Ok(statements) => {
            if let Some(statement) = statements.first() {
                let referenced = collect_objects(statement);
                objects = referenced.iter().map(ObjectRef::qualified).collect();

                if let Statement::Query(query) = statement {
                    let ctx = CheckContext {
                        objects: &referenced,
                        allowlist,
                        max_rows,
                    };
                    for check in checks::all_checks() {
                        issues.extend(check.check(query, &ctx));
                    }
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        issues = issues.len(),
        objects = objects.len(),
        "validation pass complete"
    );

    ValidationResult::from_issues(objects, dedup(issues))
}

/// Drops exact repeats while preserving first-occurrence order.
fn dedup(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen: Vec<(IssueCode, String)> = Vec::new();
    issues
        .into_iter()
        .filter(|issue| {
            let key = (issue.code, issue.message.clone());
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        })
        .collect()
}
