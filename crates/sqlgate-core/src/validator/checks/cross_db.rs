//! Database-qualified names reach outside the configured database.

use sqlparser::ast::Query;

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct CrossDatabaseReferences;

impl CheckRule for CrossDatabaseReferences {
    fn code(&self) -> IssueCode {
        IssueCode::CrossDatabase
    }

    fn name(&self) -> &'static str {
        "Cross-database references"
    }

    fn check(&self, _query: &Query, ctx: &CheckContext) -> Vec<Issue> {
        let mut flagged = Vec::new();
        for object in ctx.objects {
            if object.parts.len() >= 3 {
                let qualified = object.qualified();
                if !flagged.contains(&qualified) {
                    flagged.push(qualified);
                }
            }
        }

        flagged.sort();
        flagged
            .into_iter()
            .map(|name| {
                Issue::error(
                    IssueCode::CrossDatabase,
                    format!("Cross-database references are not allowed: {name}"),
                )
            })
            .collect()
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
        CrossDatabaseReferences.check(query, &ctx)
    }

    #[test]
    fn three_part_name_is_flagged() {
        let issues = run("SELECT 1 FROM OtherDb.dbo.Orders");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("OtherDb.dbo.Orders"));
    }

    #[test]
    fn four_part_name_is_flagged() {
        let issues = run("SELECT 1 FROM LinkedSrv.OtherDb.dbo.Orders");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn two_part_name_passes() {
        assert!(run("SELECT Name FROM Production.Product").is_empty());
    }
}
