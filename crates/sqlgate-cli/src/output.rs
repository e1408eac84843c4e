//! Terminal output formatting.

use owo_colors::OwoColorize;
use sqlgate_core::{Severity, ValidationResult};
use std::fmt::Write;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::exec::ExecutionResult;

/// Per-input validation result used by the formatter.
pub struct FileValidation {
    pub name: String,
    pub result: ValidationResult,
}

/// Format validation results as human-readable text.
pub fn format_validation(results: &[FileValidation], colored: bool) -> String {
    let mut out = String::new();

    let mut pass = 0usize;
    let mut fail = 0usize;

    for file in results {
        let status = if file.result.ok {
            pass += 1;
            if colored {
                "PASS".green().to_string()
            } else {
                "PASS".to_string()
            }
        } else {
            fail += 1;
            if colored {
                "FAIL".red().to_string()
            } else {
                "FAIL".to_string()
            }
        };

        writeln!(out, "== [{}] {}", file.name, status).unwrap();

        for issue in &file.result.issues {
            let code = if colored {
                match issue.severity {
                    Severity::Error => issue.code.to_string().red().to_string(),
                    Severity::Warning => issue.code.to_string().yellow().to_string(),
                }
            } else {
                issue.code.to_string()
            };
            writeln!(out, "  {code}  {}", issue.message).unwrap();
        }

        if !file.result.objects.is_empty() {
            let objects: Vec<&str> = file.result.objects.iter().map(String::as_str).collect();
            writeln!(out, "  objects: {}", objects.join(", ")).unwrap();
        }
    }

    let summary = format!("{pass} passed, {fail} failed");
    if colored {
        writeln!(out, "{}", summary.dimmed()).unwrap();
    } else {
        writeln!(out, "{summary}").unwrap();
    }

    out
}

/// Format validation results as JSON.
pub fn format_validation_json(results: &[FileValidation], compact: bool) -> String {
    let value: Vec<serde_json::Value> = results
        .iter()
        .map(|file| {
            serde_json::json!({
                "name": file.name,
                "result": file.result,
            })
        })
        .collect();

    if compact {
        serde_json::to_string(&value).unwrap_or_default()
    } else {
        serde_json::to_string_pretty(&value).unwrap_or_default()
    }
}

/// Render query results as a bordered table.
pub fn format_rows(result: &ExecutionResult) -> String {
    let mut builder = Builder::default();
    builder.push_record(result.columns.iter().map(|c| c.name.clone()));

    for row in &result.rows {
        builder.push_record(row.iter().map(cell));
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    table.to_string()
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ColumnMeta;
    use sqlgate_core::{Issue, IssueCode};
    use std::collections::BTreeSet;

    #[test]
    fn validation_listing_shows_codes_and_summary() {
        let results = vec![FileValidation {
            name: "query.sql".into(),
            result: ValidationResult::from_issues(
                BTreeSet::from(["Sales.Store".to_string()]),
                vec![Issue::error(
                    IssueCode::NotAllowlisted,
                    "Referenced object is not in the allowlist: Sales.Store",
                )],
            ),
        }];

        let text = format_validation(&results, false);
        assert!(text.contains("== [query.sql] FAIL"));
        assert!(text.contains("E_NOT_ALLOWLIST"));
        assert!(text.contains("objects: Sales.Store"));
        assert!(text.contains("0 passed, 1 failed"));
    }

    #[test]
    fn row_table_includes_headers_and_null() {
        let result = ExecutionResult {
            columns: vec![
                ColumnMeta {
                    name: "ProductID".into(),
                    type_name: "int".into(),
                },
                ColumnMeta {
                    name: "Color".into(),
                    type_name: "nvarchar".into(),
                },
            ],
            rows: vec![
                vec![serde_json::json!(1), serde_json::json!("Black")],
                vec![serde_json::json!(2), serde_json::Value::Null],
            ],
            row_count: 2,
            has_more: false,
        };

        let table = format_rows(&result);
        assert!(table.contains("ProductID"));
        assert!(table.contains("Black"));
        assert!(table.contains("NULL"));
    }
}
