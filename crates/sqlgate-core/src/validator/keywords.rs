//! Text-level policy checks on masked SQL.
//!
//! These run before parsing so that rejection of write/DDL/dynamic-SQL
//! constructs never depends on the parser accepting the input. They operate
//! on the masked view only: string-literal and quoted-identifier content
//! cannot trigger them.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{Issue, IssueCode};

use super::normalize::first_keyword;

/// Statement-level keywords that always mean a write or administrative
/// action.
const BANNED_OPERATIONS: &[&str] = &[
    "INSERT",
    "UPDATE",
    "DELETE",
    "MERGE",
    "DROP",
    "ALTER",
    "CREATE",
    "TRUNCATE",
    "GRANT",
    "REVOKE",
    "DENY",
    "BULK",
    "BACKUP",
    "RESTORE",
    "DBCC",
    "SHUTDOWN",
    "KILL",
    "CHECKPOINT",
    "RECONFIGURE",
    "WAITFOR",
    "OPENROWSET",
    "OPENQUERY",
    "OPENDATASOURCE",
    "OPENXML",
];

/// Dynamic-SQL entry points.
const DYNAMIC_SQL: &[&str] = &["EXEC", "EXECUTE", "SP_EXECUTESQL"];

fn word_pattern(words: &[&str]) -> Regex {
    let alternation = words.join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("static keyword pattern")
}

fn banned_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| word_pattern(BANNED_OPERATIONS))
}

fn dynamic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| word_pattern(DYNAMIC_SQL))
}

fn temp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#{1,2}[A-Za-z_][A-Za-z0-9_]*").expect("static pattern"))
}

/// Runs the statement-kind and banned-keyword checks.
///
/// Issue order is fixed: E_NOT_SELECT, then E_FORBIDDEN_OPERATION per
/// keyword in first-occurrence order, then E_DYNAMIC_SQL, then E_TEMP_TABLE
/// per referenced temp name.
pub fn check_keywords(masked: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    match first_keyword(masked) {
        Some(word) if word == "SELECT" || word == "WITH" => {}
        _ => issues.push(Issue::error(
            IssueCode::NotSelect,
            "Only SELECT statements are permitted (leading WITH CTEs are allowed)",
        )),
    }

    let mut seen = Vec::new();
    for capture in banned_pattern().find_iter(masked) {
        let keyword = capture.as_str().to_uppercase();
        if !seen.contains(&keyword) {
            seen.push(keyword);
        }
    }
    for keyword in seen {
        issues.push(Issue::error(
            IssueCode::ForbiddenOperation,
            format!("Operation not allowed: {keyword}. Only read-only SELECT statements are permitted"),
        ));
    }

    if dynamic_pattern().is_match(masked) {
        issues.push(Issue::error(
            IssueCode::DynamicSql,
            "Dynamic SQL execution is not allowed",
        ));
    }

    let mut temp_seen = Vec::new();
    for capture in temp_pattern().find_iter(masked) {
        let name = capture.as_str().to_string();
        if !temp_seen.contains(&name) {
            temp_seen.push(name);
        }
    }
    for name in temp_seen {
        issues.push(Issue::error(
            IssueCode::TempTable,
            format!("Temporary tables are not allowed: {name}"),
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::normalize::normalize;

    fn run(sql: &str) -> Vec<Issue> {
        check_keywords(&normalize(sql).masked)
    }

    fn codes(sql: &str) -> Vec<IssueCode> {
        run(sql).into_iter().map(|i| i.code).collect()
    }

    #[test]
    fn plain_select_is_clean() {
        assert!(run("SELECT Name FROM Production.Product").is_empty());
    }

    #[test]
    fn delete_statement_is_flagged_twice() {
        let codes = codes("DELETE FROM Production.Product");
        assert_eq!(
            codes,
            vec![IssueCode::NotSelect, IssueCode::ForbiddenOperation]
        );
    }

    #[test]
    fn with_prefix_is_accepted_as_statement_start() {
        assert!(run("WITH x AS (SELECT 1 AS n) SELECT n FROM x").is_empty());
    }

    #[test]
    fn exec_is_dynamic_sql() {
        assert_eq!(codes("EXEC('DROP TABLE x')")[..2].to_vec(), vec![
            IssueCode::NotSelect,
            IssueCode::DynamicSql
        ]);
    }

    #[test]
    fn sp_executesql_is_dynamic_sql() {
        assert!(codes("SELECT 1; EXEC sp_executesql N'SELECT 1'")
            .contains(&IssueCode::DynamicSql));
    }

    #[test]
    fn keyword_inside_string_does_not_trigger() {
        assert!(run("SELECT 'DELETE me' FROM Production.Product").is_empty());
    }

    #[test]
    fn keyword_inside_comment_does_not_trigger() {
        assert!(run("SELECT Name FROM Production.Product /* DROP TABLE x */").is_empty());
    }

    #[test]
    fn keyword_as_substring_does_not_trigger() {
        // UPDATE appears inside "LastUpdated" but not as a word.
        assert!(run("SELECT LastUpdated FROM Production.Product").is_empty());
    }

    #[test]
    fn temp_table_reference_is_flagged() {
        assert!(codes("SELECT * FROM #scratch").contains(&IssueCode::TempTable));
        assert!(codes("SELECT * INTO #scratch FROM Production.Product")
            .contains(&IssueCode::TempTable));
    }

    #[test]
    fn global_temp_table_is_flagged() {
        assert!(codes("SELECT * FROM ##shared").contains(&IssueCode::TempTable));
    }

    #[test]
    fn waitfor_is_forbidden() {
        assert!(codes("SELECT 1 WHERE 1 = 1 WAITFOR DELAY '00:00:10'")
            .contains(&IssueCode::ForbiddenOperation));
    }

    #[test]
    fn openrowset_is_forbidden() {
        assert!(
            codes("SELECT a.* FROM OPENROWSET('SQLNCLI', 'x', 'SELECT 1') AS a")
                .contains(&IssueCode::ForbiddenOperation)
        );
    }
}
