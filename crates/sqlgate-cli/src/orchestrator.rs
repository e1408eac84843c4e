//! The bounded generate → render → validate repair loop.
//!
//! One orchestrator run serves one end-user request and is strictly
//! sequential: GENERATE asks the candidate generator for a representation
//! and renders it, VALIDATE runs the static gate on the rendered text, and
//! REPAIR feeds the exact issue list back for another round. The loop is
//! bounded by the attempt budget; exhaustion is a terminal, reported
//! failure, never a fallback to unvalidated SQL. No SQL string leaves this
//! module as executable unless the validator passed on its exact final
//! text.
//!
//! Collaborator failures never escape: generator errors become synthetic
//! issues that consume an attempt. Cancellation is cooperative: dropping
//! the returned future between any two steps abandons the request and
//! cancels the in-flight generator call.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlgate_core::{render, validate, Allowlist, Issue, IssueCode, QuerySpec};
use tracing::{error, info, warn};

use crate::generator::{
    CandidateGenerator, GenerationError, GenerationRequest, RepairContext,
};

/// Attempt budget and validator limits for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Repair attempts after the initial generation; total generator calls
    /// are bounded by `1 + max_attempts`.
    pub max_attempts: u32,
    pub max_rows: u32,
}

/// One repair round, recorded for the audit trail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairAttempt {
    /// 1-based attempt number (the initial generation is not an attempt).
    pub attempt: u32,
    /// The SQL that failed validation and prompted this attempt
    /// (empty when the previous round produced no SQL at all).
    pub input_sql: String,
    /// Validation issues found in this attempt's output; empty on success
    /// apart from advisories.
    pub issues: Vec<Issue>,
    /// SQL rendered by this attempt, absent when generation itself failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_sql: Option<String>,
    pub success: bool,
}

/// Terminal outcome of one orchestrator run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum FinalResult {
    /// The gate passed; `sql` is exactly the text that was validated.
    Validated {
        sql: String,
        objects: BTreeSet<String>,
        /// Non-fatal advisories from the passing validation.
        warnings: Vec<Issue>,
        attempts: Vec<RepairAttempt>,
    },
    /// Attempt budget exhausted; no executable SQL is exposed.
    Rejected {
        attempts: Vec<RepairAttempt>,
        /// Ordered union of distinct issues across all attempts.
        issues: Vec<Issue>,
    },
}

impl FinalResult {
    pub fn repair_attempts(&self) -> usize {
        match self {
            Self::Validated { attempts, .. } | Self::Rejected { attempts, .. } => attempts.len(),
        }
    }
}

/// Runs the full loop for one question.
pub async fn generate_and_validate(
    generator: &dyn CandidateGenerator,
    question: &str,
    page: u32,
    page_size: u32,
    allowlist: &Allowlist,
    limits: RunLimits,
) -> FinalResult {
    let mut attempts: Vec<RepairAttempt> = Vec::new();
    let mut seen_issues: Vec<Issue> = Vec::new();
    let mut repair: Option<RepairContext> = None;
    let mut last_sql = String::new();

    // Round 0 is the initial generation; rounds 1..=max_attempts are
    // repairs. The bound holds for every input, including a generator that
    // always fails.
    for round in 0..=limits.max_attempts {
        let request = GenerationRequest {
            question: question.to_string(),
            page,
            page_size,
            repair: repair.take(),
        };

        info!(round, "requesting candidate query representation");
        let rendered = match generator.generate(&request).await {
            Ok(spec) => render_spec(&spec),
            Err(err) => Err(synthetic_issue(&err)),
        };

        let (issues, output_sql) = match rendered {
            Ok(sql) => {
                let result = validate(&sql, allowlist, limits.max_rows);
                if result.ok {
                    info!(round, "validation passed");
                    if round > 0 {
                        attempts.push(RepairAttempt {
                            attempt: round,
                            input_sql: last_sql,
                            issues: result.issues.clone(),
                            output_sql: Some(sql.clone()),
                            success: true,
                        });
                    }
                    return FinalResult::Validated {
                        sql,
                        objects: result.objects,
                        warnings: result.issues,
                        attempts,
                    };
                }
                warn!(round, issues = result.issues.len(), "validation failed");
                (result.issues, Some(sql))
            }
            Err(issue) => {
                warn!(round, code = %issue.code, "generation failed");
                (vec![issue], None)
            }
        };

        if round > 0 {
            attempts.push(RepairAttempt {
                attempt: round,
                input_sql: last_sql.clone(),
                issues: issues.clone(),
                output_sql: output_sql.clone(),
                success: false,
            });
        }

        merge_issues(&mut seen_issues, &issues);

        if let Some(sql) = output_sql {
            last_sql = sql;
        }
        repair = Some(RepairContext {
            failed_sql: last_sql.clone(),
            constraints: derive_constraints(&issues),
            issues,
        });
    }

    error!(
        attempts = attempts.len(),
        "attempt budget exhausted, request denied"
    );
    FinalResult::Rejected {
        attempts,
        issues: seen_issues,
    }
}

fn render_spec(spec: &QuerySpec) -> Result<String, Issue> {
    render(spec).map_err(|err| {
        Issue::error(
            IssueCode::GenerationFailed,
            format!("query representation rejected before rendering: {err}"),
        )
    })
}

fn synthetic_issue(err: &GenerationError) -> Issue {
    match err {
        GenerationError::Timeout(_) => Issue::error(IssueCode::GenerationTimeout, err.to_string()),
        _ => Issue::error(IssueCode::GenerationFailed, err.to_string()),
    }
}

/// Ordered union: first occurrence wins, duplicates dropped.
fn merge_issues(seen: &mut Vec<Issue>, new: &[Issue]) {
    for issue in new {
        if !seen.contains(issue) {
            seen.push(issue.clone());
        }
    }
}

/// One repair constraint per distinct error code, in issue order.
fn derive_constraints(issues: &[Issue]) -> Vec<String> {
    let mut codes: Vec<IssueCode> = Vec::new();
    for issue in issues {
        if issue.severity == sqlgate_core::Severity::Error && !codes.contains(&issue.code) {
            codes.push(issue.code);
        }
    }
    codes.into_iter().map(constraint_for).collect()
}

fn constraint_for(code: IssueCode) -> String {
    let text = match code {
        IssueCode::EmptyQuery | IssueCode::ParseError => {
            "Return a complete, well-formed query representation"
        }
        IssueCode::MultiStatement => "Emit exactly one SELECT statement",
        IssueCode::NotSelect | IssueCode::ForbiddenOperation => {
            "Emit a read-only SELECT statement only; no data modification"
        }
        IssueCode::DynamicSql => "Do not use EXEC or any dynamic SQL construct",
        IssueCode::NotAllowlisted => "Use only the allowed tables listed in the schema context",
        IssueCode::TempTable => "Do not reference or create temporary tables",
        IssueCode::SystemObject => "Do not reference system schemas or catalog views",
        IssueCode::CrossDatabase => {
            "Reference only two-part schema.table names in the configured database"
        }
        IssueCode::NoOrderBy => {
            "Add an ORDER BY clause with a unique tiebreaker (primary key) for deterministic paging"
        }
        IssueCode::AmbiguousColumn => {
            "Qualify every ORDER BY and GROUP BY column with its table alias"
        }
        IssueCode::Aggregation => {
            "Include every non-aggregated projected column in the grouping"
        }
        IssueCode::MaxRows => "Request a page size within the configured row cap",
        IssueCode::GenerationTimeout | IssueCode::GenerationFailed => {
            "Return a valid JSON query representation matching the schema"
        }
        IssueCode::CrossJoin => "Avoid CROSS JOIN unless a WHERE clause restricts it",
    };
    text.to_string()
}
