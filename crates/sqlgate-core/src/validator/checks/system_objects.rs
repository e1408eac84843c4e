//! System schemas, catalog views, and system databases are never queryable.

use sqlparser::ast::Query;

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

/// Prefixes that identify system objects regardless of allowlist content.
const SYSTEM_PREFIXES: &[&str] = &[
    "sys.",
    "information_schema.",
    "master.",
    "msdb.",
    "model.",
    "tempdb.",
];

pub struct SystemObjectReferences;

impl CheckRule for SystemObjectReferences {
    fn code(&self) -> IssueCode {
        IssueCode::SystemObject
    }

    fn name(&self) -> &'static str {
        "System object references"
    }

    fn check(&self, _query: &Query, ctx: &CheckContext) -> Vec<Issue> {
        let mut flagged = Vec::new();
        for object in ctx.objects {
            let qualified = object.qualified();
            let lower = qualified.to_lowercase();
            if SYSTEM_PREFIXES.iter().any(|p| lower.starts_with(p))
                && !flagged.contains(&qualified)
            {
                flagged.push(qualified);
            }
        }

        flagged.sort();
        flagged
            .into_iter()
            .map(|name| {
                Issue::error(
                    IssueCode::SystemObject,
                    format!("System objects are not queryable: {name}"),
                )
            })
            .collect()
    }
}
