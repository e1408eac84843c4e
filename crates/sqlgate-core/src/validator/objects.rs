//! Table/view reference extraction from a parsed statement.
//!
//! Walks the query AST (FROM and JOIN relations, derived tables, set
//! operations, and subqueries nested in expressions) collecting every
//! object name in source order. Names introduced by the statement's own
//! CTEs are not objects and are excluded, scope-aware, so `WITH x AS
//! (SELECT ... FROM Sales.Customer) SELECT * FROM x` reports only
//! `Sales.Customer`.

use sqlparser::ast::{
    Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, ObjectName, OrderByKind,
    Query, SelectItem, SetExpr, Statement, TableFactor,
};

/// One referenced object, with quoting stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Name parts in source order (`["Production", "Product"]`), unquoted,
    /// original case.
    pub parts: Vec<String>,
}

impl ObjectRef {
    fn from_name(name: &ObjectName) -> Self {
        let parts = name
            .0
            .iter()
            .map(|part| match part.as_ident() {
                Some(ident) => ident.value.clone(),
                None => part.to_string(),
            })
            .collect();
        Self { parts }
    }

    /// Dotted form: `Production.Product`.
    pub fn qualified(&self) -> String {
        self.parts.join(".")
    }

    /// True for `#local` and `##global` temp-table names.
    pub fn is_temp(&self) -> bool {
        self.parts
            .last()
            .is_some_and(|last| last.starts_with('#'))
    }
}

/// Collects every object referenced by the statement, in source order.
pub fn collect_objects(statement: &Statement) -> Vec<ObjectRef> {
    let mut objects = Vec::new();
    if let Statement::Query(query) = statement {
        let mut ctes = Vec::new();
        walk_query(query, &mut ctes, &mut objects);
    }
    objects
}

fn walk_query(query: &Query, ctes: &mut Vec<String>, out: &mut Vec<ObjectRef>) {
    let depth = ctes.len();

    if let Some(with) = &query.with {
        // Each CTE may reference the ones declared before it; its own name
        // enters scope for the rest of the statement.
        for cte in &with.cte_tables {
            walk_query(&cte.query, ctes, out);
            ctes.push(cte.alias.name.value.to_uppercase());
        }
    }

    walk_set_expr(&query.body, ctes, out);

    if let Some(order_by) = &query.order_by {
        if let OrderByKind::Expressions(exprs) = &order_by.kind {
            for key in exprs {
                walk_expr(&key.expr, ctes, out);
            }
        }
    }

    ctes.truncate(depth);
}

fn walk_set_expr(body: &SetExpr, ctes: &mut Vec<String>, out: &mut Vec<ObjectRef>) {
    match body {
        SetExpr::Select(select) => {
            for table_with_joins in &select.from {
                walk_table_factor(&table_with_joins.relation, ctes, out);
                for join in &table_with_joins.joins {
                    walk_table_factor(&join.relation, ctes, out);
                }
            }
            for item in &select.projection {
                if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } =
                    item
                {
                    walk_expr(expr, ctes, out);
                }
            }
            if let Some(selection) = &select.selection {
                walk_expr(selection, ctes, out);
            }
            if let Some(having) = &select.having {
                walk_expr(having, ctes, out);
            }
            if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
                for expr in exprs {
                    walk_expr(expr, ctes, out);
                }
            }
        }
        SetExpr::Query(query) => walk_query(query, ctes, out),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, ctes, out);
            walk_set_expr(right, ctes, out);
        }
        _ => {}
    }
}

fn walk_table_factor(factor: &TableFactor, ctes: &mut Vec<String>, out: &mut Vec<ObjectRef>) {
    match factor {
        TableFactor::Table { name, .. } => {
            let object = ObjectRef::from_name(name);
            let is_cte =
                object.parts.len() == 1 && ctes.contains(&object.parts[0].to_uppercase());
            if !is_cte {
                out.push(object);
            }
        }
        TableFactor::Derived { subquery, .. } => walk_query(subquery, ctes, out),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            walk_table_factor(&table_with_joins.relation, ctes, out);
            for join in &table_with_joins.joins {
                walk_table_factor(&join.relation, ctes, out);
            }
        }
        _ => {}
    }
}

/// Descends into expressions far enough to find nested subqueries
/// (`WHERE EXISTS (...)`, `IN (SELECT ...)`, scalar subqueries).
fn walk_expr(expr: &Expr, ctes: &mut Vec<String>, out: &mut Vec<ObjectRef>) {
    match expr {
        Expr::Subquery(query) => walk_query(query, ctes, out),
        Expr::Exists { subquery, .. } => walk_query(subquery, ctes, out),
        Expr::InSubquery { expr, subquery, .. } => {
            walk_expr(expr, ctes, out);
            walk_query(subquery, ctes, out);
        }
        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left, ctes, out);
            walk_expr(right, ctes, out);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) => walk_expr(expr, ctes, out),
        Expr::IsNull(expr) | Expr::IsNotNull(expr) => walk_expr(expr, ctes, out),
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(expr, ctes, out);
            walk_expr(low, ctes, out);
            walk_expr(high, ctes, out);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, ctes, out);
            for item in list {
                walk_expr(item, ctes, out);
            }
        }
        Expr::Cast { expr, .. } => walk_expr(expr, ctes, out),
        Expr::Like { expr, pattern, .. } => {
            walk_expr(expr, ctes, out);
            walk_expr(pattern, ctes, out);
        }
        Expr::Function(function) => match &function.args {
            FunctionArguments::Subquery(query) => walk_query(query, ctes, out),
            FunctionArguments::List(list) => {
                for arg in &list.args {
                    if let FunctionArg::Unnamed(FunctionArgExpr::Expr(expr))
                    | FunctionArg::Named {
                        arg: FunctionArgExpr::Expr(expr),
                        ..
                    } = arg
                    {
                        walk_expr(expr, ctes, out);
                    }
                }
            }
            FunctionArguments::None => {}
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql;

    fn objects(sql: &str) -> Vec<String> {
        let statements = parse_sql(sql).expect("parse");
        collect_objects(&statements[0])
            .iter()
            .map(ObjectRef::qualified)
            .collect()
    }

    #[test]
    fn collects_from_and_join_tables() {
        let found = objects(
            "SELECT c.CustomerID FROM Sales.Customer AS c \
             INNER JOIN Sales.SalesOrderHeader AS h ON c.CustomerID = h.CustomerID",
        );
        assert_eq!(found, vec!["Sales.Customer", "Sales.SalesOrderHeader"]);
    }

    #[test]
    fn excludes_cte_names_but_keeps_their_sources() {
        let found = objects(
            "WITH recent AS (SELECT SalesOrderID FROM Sales.SalesOrderHeader) \
             SELECT SalesOrderID FROM recent",
        );
        assert_eq!(found, vec!["Sales.SalesOrderHeader"]);
    }

    #[test]
    fn cte_shadowing_is_scope_aware() {
        // The CTE body itself refers to the real table, not the CTE.
        let found = objects(
            "WITH Product AS (SELECT ProductID FROM Production.Product) \
             SELECT ProductID FROM Product",
        );
        assert_eq!(found, vec!["Production.Product"]);
    }

    #[test]
    fn finds_tables_in_where_subqueries() {
        let found = objects(
            "SELECT Name FROM Production.Product WHERE ProductID IN \
             (SELECT ProductID FROM Sales.SalesOrderDetail)",
        );
        assert_eq!(found, vec!["Production.Product", "Sales.SalesOrderDetail"]);
    }

    #[test]
    fn finds_tables_in_exists() {
        let found = objects(
            "SELECT CustomerID FROM Sales.Customer AS c WHERE EXISTS \
             (SELECT 1 FROM Sales.SalesOrderHeader AS h WHERE h.CustomerID = c.CustomerID)",
        );
        assert_eq!(found, vec!["Sales.Customer", "Sales.SalesOrderHeader"]);
    }

    #[test]
    fn finds_tables_in_derived_tables() {
        let found = objects(
            "SELECT t.n FROM (SELECT COUNT(*) AS n FROM Sales.SalesOrderDetail) AS t",
        );
        assert_eq!(found, vec!["Sales.SalesOrderDetail"]);
    }

    #[test]
    fn bracketed_names_are_unquoted() {
        let found = objects("SELECT [Name] FROM [Production].[Product]");
        assert_eq!(found, vec!["Production.Product"]);
    }

    #[test]
    fn three_part_names_keep_all_parts() {
        let found = objects("SELECT 1 FROM OtherDb.dbo.Secrets");
        assert_eq!(found, vec!["OtherDb.dbo.Secrets"]);
    }

    #[test]
    fn union_branches_are_both_walked() {
        let found = objects(
            "SELECT ProductID FROM Production.Product \
             UNION ALL SELECT ProductID FROM Sales.SalesOrderDetail",
        );
        assert_eq!(found, vec!["Production.Product", "Sales.SalesOrderDetail"]);
    }
}
