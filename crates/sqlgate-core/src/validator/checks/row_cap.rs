//! Explicit fetch sizes above the configured cap are rejected outright,
//! never silently truncated, so the validated text is exactly what runs.

use sqlparser::ast::{Expr, LimitClause, Query, SetExpr, TopQuantity, Value};

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct FetchSizeCap;

impl CheckRule for FetchSizeCap {
    fn code(&self) -> IssueCode {
        IssueCode::MaxRows
    }

    fn name(&self) -> &'static str {
        "Fetch size cap"
    }

    fn check(&self, query: &Query, ctx: &CheckContext) -> Vec<Issue> {
        let mut sizes = Vec::new();

        if let SetExpr::Select(select) = query.body.as_ref() {
            if let Some(top) = &select.top {
                match &top.quantity {
                    Some(TopQuantity::Constant(n)) => sizes.push(("TOP", *n)),
                    Some(TopQuantity::Expr(expr)) => {
                        if let Some(n) = numeric(expr) {
                            sizes.push(("TOP", n));
                        }
                    }
                    None => {}
                }
            }
        }

        if let Some(fetch) = &query.fetch {
            if let Some(n) = fetch.quantity.as_ref().and_then(numeric) {
                sizes.push(("FETCH NEXT", n));
            }
        }

        if let Some(LimitClause::LimitOffset {
            limit: Some(limit), ..
        }) = &query.limit_clause
        {
            if let Some(n) = numeric(limit) {
                sizes.push(("LIMIT", n));
            }
        }

        sizes
            .into_iter()
            .filter(|(_, n)| *n > u64::from(ctx.max_rows))
            .map(|(clause, n)| {
                Issue::error(
                    IssueCode::MaxRows,
                    format!(
                        "{clause} {n} exceeds the configured row cap of {}",
                        ctx.max_rows
                    ),
                )
            })
            .collect()
    }
}

fn numeric(expr: &Expr) -> Option<u64> {
    if let Expr::Value(value) = expr {
        if let Value::Number(raw, _) = &value.value {
            return raw.parse().ok();
        }
    }
    None
}
