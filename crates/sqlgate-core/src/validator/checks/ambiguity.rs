//! Unqualified ORDER BY / GROUP BY columns are ambiguous when more than one
//! table alias is in scope.

use sqlparser::ast::{Expr, GroupByExpr, OrderByKind, Query, SetExpr, TableFactor};

use crate::types::{Issue, IssueCode};
use crate::validator::rule::{CheckContext, CheckRule};

pub struct UnqualifiedColumns;

impl CheckRule for UnqualifiedColumns {
    fn code(&self) -> IssueCode {
        IssueCode::AmbiguousColumn
    }

    fn name(&self) -> &'static str {
        "Unqualified columns under multiple aliases"
    }

    fn check(&self, query: &Query, _ctx: &CheckContext) -> Vec<Issue> {
        if aliases_in_scope(query) < 2 {
            return Vec::new();
        }

        let mut issues = Vec::new();

        if let Some(order_by) = &query.order_by {
            if let OrderByKind::Expressions(exprs) = &order_by.kind {
                for key in exprs {
                    if let Expr::Identifier(ident) = &key.expr {
                        issues.push(Issue::error(
                            IssueCode::AmbiguousColumn,
                            format!(
                                "ORDER BY column {} must be alias-qualified when multiple tables are in scope",
                                ident.value
                            ),
                        ));
                    }
                }
            }
        }

        if let SetExpr::Select(select) = query.body.as_ref() {
            if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
                for expr in exprs {
                    if let Expr::Identifier(ident) = expr {
                        issues.push(Issue::error(
                            IssueCode::AmbiguousColumn,
                            format!(
                                "GROUP BY column {} must be alias-qualified when multiple tables are in scope",
                                ident.value
                            ),
                        ));
                    }
                }
            }
        }

        issues
    }
}

/// Number of distinct table sources at the top level of the query.
fn aliases_in_scope(query: &Query) -> usize {
    let SetExpr::Select(select) = query.body.as_ref() else {
        return 0;
    };
    let mut count = 0;
    for table_with_joins in &select.from {
        count += countable(&table_with_joins.relation);
        for join in &table_with_joins.joins {
            count += countable(&join.relation);
        }
    }
    count
}

fn countable(factor: &TableFactor) -> usize {
    match factor {
        TableFactor::Table { .. } | TableFactor::Derived { .. } => 1,
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            let mut count = countable(&table_with_joins.relation);
            for join in &table_with_joins.joins {
                count += countable(&join.relation);
            }
            count
        }
        _ => 0,
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
        let allowlist = Allowlist::from_csv("Production.Product,Sales.SalesOrderDetail");
        let ctx = CheckContext {
            objects: &objects,
            allowlist: &allowlist,
            max_rows: 5000,
        };
        UnqualifiedColumns.check(query, &ctx)
    }

    #[test]
    fn bare_order_by_with_two_tables_is_flagged() {
        let issues = run(
            "SELECT p.Name, d.OrderQty FROM Production.Product AS p \
             INNER JOIN Sales.SalesOrderDetail AS d ON p.ProductID = d.ProductID \
             ORDER BY ProductID",
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::AmbiguousColumn);
    }

    #[test]
    fn qualified_order_by_passes() {
        let issues = run(
            "SELECT p.Name, d.OrderQty FROM Production.Product AS p \
             INNER JOIN Sales.SalesOrderDetail AS d ON p.ProductID = d.ProductID \
             ORDER BY p.ProductID",
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn single_table_bare_columns_pass() {
        let issues = run("SELECT Name FROM Production.Product ORDER BY ProductID");
        assert!(issues.is_empty());
    }

    #[test]
    fn bare_group_by_with_two_tables_is_flagged() {
        let issues = run(
            "SELECT p.Color, COUNT(*) AS n FROM Production.Product AS p \
             INNER JOIN Sales.SalesOrderDetail AS d ON p.ProductID = d.ProductID \
             GROUP BY Color ORDER BY p.Color",
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("GROUP BY"));
    }
}
