//! Advisory: a CROSS JOIN with no WHERE restriction is a cartesian product.

use sqlparser::ast::{JoinOperator, Query, SetExpr};

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct UnrestrictedCrossJoin;

impl CheckRule for UnrestrictedCrossJoin {
    fn code(&self) -> IssueCode {
        IssueCode::CrossJoin
    }

    fn name(&self) -> &'static str {
        "Unrestricted CROSS JOIN"
    }

    fn check(&self, query: &Query, _ctx: &CheckContext) -> Vec<Issue> {
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Vec::new();
        };
        if select.selection.is_some() {
            return Vec::new();
        }

        let has_cross_join = select.from.iter().any(|table| {
            table
                .joins
                .iter()
                .any(|join| matches!(join.join_operator, JoinOperator::CrossJoin(_)))
        });

        if has_cross_join {
            vec![Issue::warning(
                IssueCode::CrossJoin,
                "CROSS JOIN without a WHERE clause may produce a cartesian product",
            )]
        } else {
            Vec::new()
        }
    }
}
