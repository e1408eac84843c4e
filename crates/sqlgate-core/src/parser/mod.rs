use sqlparser::ast::Statement;
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::{Parser, ParserError};

/// Parse SQL text with the T-SQL dialect.
///
/// This is the only dialect the gate targets; parse failures are reported by
/// the validator as `E_PARSE_ERROR` issues rather than propagated.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, ParserError> {
    Parser::parse_sql(&MsSqlDialect {}, sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_select_with_paging() {
        let sql = "SELECT ProductID FROM Production.Product ORDER BY ProductID \
                   OFFSET 0 ROWS FETCH NEXT 20 ROWS ONLY";
        let statements = parse_sql(sql).unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn parses_top() {
        let statements = parse_sql("SELECT TOP 10 Name FROM Production.Product").unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn parses_cte() {
        let sql = "WITH recent AS (SELECT SalesOrderID FROM Sales.SalesOrderHeader) \
                   SELECT SalesOrderID FROM recent";
        assert!(parse_sql(sql).is_ok());
    }

    #[test]
    fn parses_bracketed_identifiers() {
        assert!(parse_sql("SELECT [Name] FROM [Production].[Product]").is_ok());
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(parse_sql("SELECT * FROM").is_err());
    }
}
