//! Row-limited queries must carry an ORDER BY, or paging can skip and
//! duplicate rows across pages.

use sqlparser::ast::{OrderByKind, Query, SetExpr};

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct PagingRequiresOrderBy;

impl CheckRule for PagingRequiresOrderBy {
    fn code(&self) -> IssueCode {
        IssueCode::NoOrderBy
    }

    fn name(&self) -> &'static str {
        "Paging requires ORDER BY"
    }

    fn check(&self, query: &Query, _ctx: &CheckContext) -> Vec<Issue> {
        if has_order_by(query) {
            return Vec::new();
        }

        let mut issues = Vec::new();
        if has_top(query) {
            issues.push(Issue::error(
                IssueCode::NoOrderBy,
                "TOP requires ORDER BY for deterministic results",
            ));
        }
        if query.fetch.is_some() || query.limit_clause.is_some() {
            issues.push(Issue::error(
                IssueCode::NoOrderBy,
                "OFFSET/FETCH requires ORDER BY for deterministic results",
            ));
        }
        issues
    }
}

fn has_order_by(query: &Query) -> bool {
    query.order_by.as_ref().is_some_and(|ob| match &ob.kind {
        OrderByKind::Expressions(exprs) => !exprs.is_empty(),
        OrderByKind::All(_) => true,
    })
}

fn has_top(query: &Query) -> bool {
    match query.body.as_ref() {
        SetExpr::Select(select) => select.top.is_some(),
        SetExpr::Query(inner) => has_top(inner),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::Allowlist;
    use crate::parser::parse_sql;
    use crate::validator::objects::collect_objects;

    fn run(sql: &str) -> Vec<Issue> {
        let statements = parse_sql(sql).expect("parse");
        let sqlparser::ast::Statement::Query(query) = &statements[0] else {
            panic!("expected query");
        };
        let objects = collect_objects(&statements[0]);
        let allowlist = Allowlist::from_csv("Production.Product");
        let ctx = CheckContext {
            objects: &objects,
            allowlist: &allowlist,
            max_rows: 5000,
        };
        PagingRequiresOrderBy.check(query, &ctx)
    }

    #[test]
    fn top_without_order_by_is_flagged() {
        let issues = run("SELECT TOP 10 Name FROM Production.Product");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::NoOrderBy);
    }

    #[test]
    fn top_with_order_by_passes() {
        assert!(run("SELECT TOP 10 Name FROM Production.Product ORDER BY ProductID").is_empty());
    }

    #[test]
    fn offset_fetch_without_order_by_is_flagged() {
        // T-SQL itself rejects this; the gate reports it statically.
        let sql = "SELECT Name FROM Production.Product OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY";
        let issues = run(sql);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("OFFSET/FETCH"));
    }

    #[test]
    fn offset_fetch_with_order_by_passes() {
        let sql = "SELECT Name FROM Production.Product \
                   ORDER BY ProductID OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY";
        assert!(run(sql).is_empty());
    }

    #[test]
    fn unlimited_select_needs_no_order_by() {
        assert!(run("SELECT Name FROM Production.Product").is_empty());
    }
}
