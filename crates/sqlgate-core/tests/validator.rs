//! End-to-end validator scenarios over the public API.

use rstest::rstest;
use sqlgate_core::{validate, Allowlist, IssueCode, Severity};

fn allowlist() -> Allowlist {
    Allowlist::from_csv(
        "Sales.SalesOrderHeader,Sales.SalesOrderDetail,Production.Product,Person.Person",
    )
}

fn run(sql: &str) -> sqlgate_core::ValidationResult {
    validate(sql, &allowlist(), 5000)
}

#[test]
fn top_without_order_by_then_repaired() {
    let rejected = run("SELECT TOP 10 * FROM Production.Product");
    assert!(!rejected.ok);
    assert!(rejected.has(IssueCode::NoOrderBy));

    let repaired = run("SELECT TOP 10 * FROM Production.Product ORDER BY ProductID");
    assert!(repaired.ok, "unexpected issues: {:?}", repaired.issues);
}

#[test]
fn sys_tables_is_rejected_regardless_of_rewrites() {
    for sql in [
        "SELECT name FROM sys.tables",
        "SELECT t.name FROM sys.tables AS t ORDER BY t.name",
        "SELECT TOP 5 name FROM sys.tables ORDER BY name",
    ] {
        let result = run(sql);
        assert!(!result.ok);
        assert!(result.has(IssueCode::SystemObject), "for {sql}");
    }
}

#[rstest]
#[case::insert("INSERT INTO Production.Product (Name) VALUES ('x')")]
#[case::update("UPDATE Production.Product SET Name = 'x' WHERE ProductID = 1")]
#[case::delete("DELETE FROM Production.Product")]
#[case::merge(
    "MERGE Production.Product AS t USING Production.Product AS s ON t.ProductID = s.ProductID \
     WHEN MATCHED THEN UPDATE SET t.Name = s.Name;"
)]
#[case::drop("DROP TABLE Production.Product")]
#[case::alter("ALTER TABLE Production.Product ADD Extra INT")]
#[case::truncate("TRUNCATE TABLE Production.Product")]
fn write_statements_are_policy_violations(#[case] sql: &str) {
    let result = run(sql);
    assert!(!result.ok);
    assert!(
        result.has(IssueCode::ForbiddenOperation) || result.has(IssueCode::NotSelect),
        "issues: {:?}",
        result.issues
    );
}

#[rstest]
#[case::exec_paren("EXEC('SELECT 1')")]
#[case::execute("EXECUTE ('SELECT 1')")]
#[case::sp_executesql("EXEC sp_executesql N'SELECT 1'")]
fn dynamic_sql_is_rejected(#[case] sql: &str) {
    let result = run(sql);
    assert!(!result.ok);
    assert!(result.has(IssueCode::DynamicSql), "issues: {:?}", result.issues);
}

#[test]
fn multi_statement_injection_is_rejected() {
    let result = run("SELECT Name FROM Production.Product; DROP TABLE Production.Product");
    assert!(!result.ok);
    assert!(result.has(IssueCode::MultiStatement));
    assert!(result.has(IssueCode::ForbiddenOperation));
}

#[test]
fn case_insensitive_allowlist_property() {
    let lower = run("SELECT Name FROM production.product ORDER BY ProductID \
                     OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY");
    let mixed = run("SELECT Name FROM Production.PRODUCT ORDER BY ProductID \
                     OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY");
    assert!(lower.ok, "issues: {:?}", lower.issues);
    assert!(mixed.ok, "issues: {:?}", mixed.issues);
}

#[test]
fn comment_stripping_blocks_smuggling_but_not_content() {
    // A blocked keyword hidden in a comment must not cause rejection...
    let hidden = run(
        "SELECT ProductID FROM Production.Product /* DELETE */ \
         ORDER BY ProductID OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY",
    );
    assert!(hidden.ok, "issues: {:?}", hidden.issues);

    // ...and a comment must not be able to hide a real second statement.
    let smuggled = run("SELECT ProductID FROM Production.Product /* x */; DROP TABLE y");
    assert!(smuggled.has(IssueCode::ForbiddenOperation));
}

#[test]
fn unqualified_table_is_rejected() {
    let result = run("SELECT Name FROM Product ORDER BY ProductID \
                      OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY");
    assert!(!result.ok);
    assert!(result.has(IssueCode::NotAllowlisted));
}

#[test]
fn cross_db_reference_is_rejected() {
    let result = run("SELECT 1 FROM AdventureWorksDW.dbo.FactInternetSales");
    assert!(!result.ok);
    assert!(result.has(IssueCode::CrossDatabase));
}

#[test]
fn fetch_above_max_rows_is_rejected_not_truncated() {
    let result = run(
        "SELECT ProductID FROM Production.Product ORDER BY ProductID \
         OFFSET 0 ROWS FETCH NEXT 50000 ROWS ONLY",
    );
    assert!(!result.ok);
    assert!(result.has(IssueCode::MaxRows));
}

#[test]
fn cross_join_advisory_does_not_block() {
    let result = run(
        "SELECT p.Name FROM Production.Product AS p CROSS JOIN Person.Person AS q \
         ORDER BY p.ProductID OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY",
    );
    assert!(result.ok, "issues: {:?}", result.issues);
    let warning = result
        .issues
        .iter()
        .find(|i| i.code == IssueCode::CrossJoin)
        .expect("advisory expected");
    assert_eq!(warning.severity, Severity::Warning);
}

#[test]
fn ambiguous_order_by_is_rejected() {
    let result = run(
        "SELECT h.SalesOrderID, d.LineTotal FROM Sales.SalesOrderHeader AS h \
         INNER JOIN Sales.SalesOrderDetail AS d ON h.SalesOrderID = d.SalesOrderID \
         ORDER BY SalesOrderID OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY",
    );
    assert!(!result.ok);
    assert!(result.has(IssueCode::AmbiguousColumn));
}

#[test]
fn aggregation_mismatch_names_the_column() {
    let result = run("SELECT Color, COUNT(*) AS n FROM Production.Product");
    assert!(!result.ok);
    let issue = result
        .issues
        .iter()
        .find(|i| i.code == IssueCode::Aggregation)
        .expect("aggregation issue expected");
    assert!(issue.message.contains("Color"));
}

#[test]
fn objects_are_reported_for_failing_queries_too() {
    let result = run("SELECT TOP 3 a.Name FROM Sales.Store AS a");
    assert!(!result.ok);
    assert!(result.objects.contains("Sales.Store"));
}
