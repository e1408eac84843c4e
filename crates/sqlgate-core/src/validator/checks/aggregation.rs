//! Aggregated projections must group every plain column.

use sqlparser::ast::{Expr, GroupByExpr, Query, Select, SelectItem, SetExpr};

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

const AGGREGATE_FUNCTIONS: &[&str] = &[
    "COUNT", "COUNT_BIG", "SUM", "AVG", "MIN", "MAX", "STDEV", "STDEVP", "VAR", "VARP",
];

pub struct AggregationConsistency;

impl CheckRule for AggregationConsistency {
    fn code(&self) -> IssueCode {
        IssueCode::Aggregation
    }

    fn name(&self) -> &'static str {
        "Aggregation consistency"
    }

    fn check(&self, query: &Query, _ctx: &CheckContext) -> Vec<Issue> {
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Vec::new();
        };
        check_select(select)
    }
}

fn check_select(select: &Select) -> Vec<Issue> {
    let has_aggregate = select.projection.iter().any(|item| match item {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            is_aggregate(expr)
        }
        _ => false,
    });
    if !has_aggregate {
        return Vec::new();
    }

    let group_keys = group_by_keys(select);
    let mut issues = Vec::new();

    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                if is_aggregate(expr) {
                    continue;
                }
                if let Some(column) = column_name(expr) {
                    if !grouped(&group_keys, &column) {
                        issues.push(Issue::error(
                            IssueCode::Aggregation,
                            format!(
                                "Column {column} must appear in GROUP BY or be aggregated"
                            ),
                        ));
                    }
                }
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                issues.push(Issue::error(
                    IssueCode::Aggregation,
                    "Wildcard projection cannot be combined with aggregate functions",
                ));
            }
        }
    }

    issues
}

fn is_aggregate(expr: &Expr) -> bool {
    if let Expr::Function(function) = expr {
        let name = function
            .name
            .0
            .last()
            .map(|part| part.to_string().to_uppercase())
            .unwrap_or_default();
        return AGGREGATE_FUNCTIONS.contains(&name.as_str());
    }
    false
}

/// Dotted, uppercase form of a plain column expression.
fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(idents) => Some(
            idents
                .iter()
                .map(|i| i.value.as_str())
                .collect::<Vec<_>>()
                .join("."),
        ),
        _ => None,
    }
}

fn group_by_keys(select: &Select) -> Vec<String> {
    let GroupByExpr::Expressions(exprs, _) = &select.group_by else {
        return Vec::new();
    };
    exprs
        .iter()
        .filter_map(column_name)
        .map(|name| name.to_uppercase())
        .collect()
}

/// A projection column matches a grouping key on the full dotted form, or on
/// the bare name when either side is unqualified.
fn grouped(keys: &[String], column: &str) -> bool {
    let upper = column.to_uppercase();
    let tail = upper.rsplit('.').next().unwrap_or(&upper).to_string();
    keys.iter().any(|key| {
        let key_tail = key.rsplit('.').next().unwrap_or(key);
        *key == upper || key_tail == tail
    })
}
