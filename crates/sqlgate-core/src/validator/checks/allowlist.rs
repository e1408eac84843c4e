//! Allowlist membership for every referenced object.

use sqlparser::ast::Query;

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct AllowlistMembership;

impl CheckRule for AllowlistMembership {
    fn code(&self) -> IssueCode {
        IssueCode::NotAllowlisted
    }

    fn name(&self) -> &'static str {
        "Allowlist membership"
    }

    fn check(&self, _query: &Query, ctx: &CheckContext) -> Vec<Issue> {
        let mut flagged = Vec::new();
        for object in ctx.objects {
            if object.is_temp() {
                // Reported as E_TEMP_TABLE elsewhere; membership is moot.
                continue;
            }
            let qualified = object.qualified();
            if flagged.contains(&qualified) {
                continue;
            }
            if object.parts.len() == 1 {
                flagged.push(qualified.clone());
                continue;
            }
            if !ctx.allowlist.contains(&qualified) {
                flagged.push(qualified);
            }
        }

        flagged.sort();
        flagged
            .into_iter()
            .map(|name| {
                let message = if name.contains('.') {
                    format!("Referenced object is not in the allowlist: {name}")
                } else {
                    format!(
                        "Unqualified table name cannot be checked against the allowlist: {name}. \
                         Use the schema-qualified form"
                    )
                };
                Issue::error(IssueCode::NotAllowlisted, message)
            })
            .collect()
    }
}
