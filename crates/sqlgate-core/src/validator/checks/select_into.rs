//! SELECT ... INTO targets imply a write and are always rejected.

use sqlparser::ast::{Query, SetExpr};

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct SelectIntoTarget;

impl CheckRule for SelectIntoTarget {
    fn code(&self) -> IssueCode {
        IssueCode::TempTable
    }

    fn name(&self) -> &'static str {
        "SELECT INTO target"
    }

    fn check(&self, query: &Query, _ctx: &CheckContext) -> Vec<Issue> {
        let mut issues = Vec::new();
        collect(&query.body, &mut issues);
        issues
    }
}

fn collect(body: &SetExpr, issues: &mut Vec<Issue>) {
    match body {
        SetExpr::Select(select) => {
            if let Some(into) = &select.into {
                let target = into.name.to_string();
                let issue = if target.contains('#') {
                    Issue::error(
                        IssueCode::TempTable,
                        format!("SELECT INTO a temporary table is not allowed: {target}"),
                    )
                } else {
                    Issue::error(
                        IssueCode::ForbiddenOperation,
                        format!("SELECT INTO creates a table and is not allowed: {target}"),
                    )
                };
                issues.push(issue);
            }
        }
        SetExpr::Query(query) => collect(&query.body, issues),
        SetExpr::SetOperation { left, right, .. } => {
            collect(left, issues);
            collect(right, issues);
        }
        _ => {}
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
        SelectIntoTarget.check(query, &ctx)
    }

    #[test]
    fn plain_select_is_clean() {
        assert!(run("SELECT Name FROM Production.Product").is_empty());
    }

    #[test]
    fn into_temp_table_is_temp_table_issue() {
        let issues = run("SELECT Name INTO #scratch FROM Production.Product");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::TempTable);
    }

    #[test]
    fn into_regular_table_is_forbidden_operation() {
        let issues = run("SELECT Name INTO dbo.Copy FROM Production.Product");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::ForbiddenOperation);
    }
}
