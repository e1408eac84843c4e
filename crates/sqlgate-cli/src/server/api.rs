//! REST API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::orchestrator::{generate_and_validate, FinalResult, RepairAttempt, RunLimits};

use super::AppState;

/// Build the API router with all endpoints.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/validate", post(validate_sql))
        .route("/ask", post(ask))
        .route("/config", get(config))
}

// === Request/Response types ===

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    components: HealthComponents,
}

#[derive(Serialize)]
struct HealthComponents {
    generator: &'static str,
    executor: &'static str,
}

#[derive(Deserialize)]
struct ValidateRequest {
    sql: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest {
    question: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskSuccess {
    sql: String,
    columns: Vec<crate::exec::ColumnMeta>,
    rows: Vec<Vec<serde_json::Value>>,
    page: u32,
    page_size: u32,
    meta: AskMeta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskMeta {
    correlation_id: String,
    validated: bool,
    repair_attempts: usize,
    row_count: usize,
    has_more: bool,
    executed: bool,
    objects: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<sqlgate_core::Issue>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskFailure {
    error: &'static str,
    issues: Vec<sqlgate_core::Issue>,
    meta: FailureMeta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureMeta {
    correlation_id: String,
    validation_passed: bool,
    repair_attempts: usize,
    attempts: Vec<RepairAttempt>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    allowlist: Vec<String>,
    max_rows: u32,
    max_attempts: u32,
    generator_model: Option<String>,
    executor_configured: bool,
}

// === Handlers ===

/// GET /api/health - component status with version
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        components: HealthComponents {
            generator: if state.generator.is_some() {
                "configured"
            } else {
                "not_configured"
            },
            executor: if state.executor.is_some() {
                "configured"
            } else {
                "not_configured"
            },
        },
    })
}

/// POST /api/validate - run the static gate on raw SQL
async fn validate_sql(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateRequest>,
) -> impl IntoResponse {
    let result = sqlgate_core::validate(
        &payload.sql,
        &state.config.allowlist,
        state.config.max_rows,
    );
    Json(result)
}

/// POST /api/ask - full question → validated SQL → results flow
async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let correlation_id = correlation_id(&headers);

    let Some(generator) = &state.generator else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "GENERATOR_NOT_CONFIGURED",
                "meta": { "correlationId": correlation_id },
            })),
        ));
    };

    info!(%correlation_id, question = %payload.question, "ask request received");

    let limits = RunLimits {
        max_attempts: state.config.max_attempts,
        max_rows: state.config.max_rows,
    };
    let page = payload.page.max(1);
    let page_size = payload.page_size.clamp(1, state.config.max_rows);

    let outcome = generate_and_validate(
        generator.as_ref(),
        &payload.question,
        page,
        page_size,
        &state.config.allowlist,
        limits,
    )
    .await;

    match outcome {
        FinalResult::Validated {
            sql,
            objects,
            warnings,
            attempts,
        } => {
            let repair_attempts = attempts.len();
            let (columns, rows, row_count, has_more, executed) = match &state.executor {
                Some(executor) => match executor.execute(&sql).await {
                    Ok(result) => (
                        result.columns,
                        result.rows,
                        result.row_count,
                        result.has_more,
                        true,
                    ),
                    Err(err) => {
                        error!(%correlation_id, error = %err, "execution failed");
                        return Err((
                            StatusCode::UNPROCESSABLE_ENTITY,
                            Json(serde_json::json!({
                                "error": "SQL_EXECUTION_ERROR",
                                "message": err.to_string(),
                                "meta": {
                                    "correlationId": correlation_id,
                                    "sql": sql,
                                    "repairAttempts": repair_attempts,
                                },
                            })),
                        ));
                    }
                },
                None => (Vec::new(), Vec::new(), 0, false, false),
            };

            Ok(Json(AskSuccess {
                sql,
                columns,
                rows,
                page,
                page_size,
                meta: AskMeta {
                    correlation_id,
                    validated: true,
                    repair_attempts,
                    row_count,
                    has_more,
                    executed,
                    objects: objects.into_iter().collect(),
                    warnings,
                },
            }))
        }
        FinalResult::Rejected { attempts, issues } => {
            let failure = AskFailure {
                error: "SQL_VALIDATION_FAILED",
                issues,
                meta: FailureMeta {
                    correlation_id,
                    validation_passed: false,
                    repair_attempts: attempts.len(),
                    attempts,
                },
            };
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::to_value(failure).unwrap_or_default()),
            ))
        }
    }
}

/// GET /api/config - redacted effective configuration
async fn config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        allowlist: state
            .config
            .allowlist
            .iter()
            .map(ToString::to_string)
            .collect(),
        max_rows: state.config.max_rows,
        max_attempts: state.config.max_attempts,
        generator_model: state
            .config
            .generator
            .as_ref()
            .map(|g| g.model.clone()),
        executor_configured: state.executor.is_some(),
    })
}

/// Inbound X-Request-ID wins; otherwise a fresh UUID.
fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
