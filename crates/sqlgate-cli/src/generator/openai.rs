//! OpenAI-compatible chat-completions candidate generator.

use async_trait::async_trait;
use schemars::schema_for;
use serde::Deserialize;
use sqlgate_core::QuerySpec;
use tracing::warn;

use crate::config::GeneratorConfig;

use super::{CandidateGenerator, GenerationError, GenerationRequest, SchemaContext};

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
    schema: SchemaContext,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig, schema: SchemaContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            schema,
        }
    }

    fn system_prompt(&self) -> String {
        let json_schema = serde_json::to_string_pretty(&schema_for!(QuerySpec))
            .unwrap_or_else(|_| "{}".to_string());
        let tables: Vec<&str> = self
            .schema
            .tables
            .iter()
            .map(|t| t.name.as_str())
            .collect();

        format!(
            "You are a T-SQL expert working with Microsoft SQL Server.\n\n\
             SCHEMA CONTEXT:\n{schema}\n\
             REQUIREMENTS:\n\
             - Use only these allowed tables: {allowed}\n\
             - Always include orderBy with a unique tiebreaker (primary key) for deterministic paging\n\
             - Qualify every column with its table alias\n\
             - Prefer INNER joins expressed in the joins list\n\n\
             Respond with a single JSON object matching this schema, no prose:\n{json_schema}",
            schema = self.schema.prompt_block(),
            allowed = tables.join(", "),
        )
    }

    fn user_prompt(request: &GenerationRequest) -> String {
        let offset = u64::from(request.page.saturating_sub(1)) * u64::from(request.page_size);
        let mut prompt = format!(
            "USER QUESTION: {}\n\n\
             PAGINATION CONTEXT:\n\
             - Return page {} with {} results per page\n\
             - Use paging offset {} and fetch {}\n",
            request.question, request.page, request.page_size, offset, request.page_size
        );

        if let Some(repair) = &request.repair {
            prompt.push_str("\nThe previous attempt was rejected. Failed SQL:\n");
            prompt.push_str(&repair.failed_sql);
            prompt.push_str("\n\nValidation issues:\n");
            for issue in &repair.issues {
                prompt.push_str(&format!("- {}: {}\n", issue.code, issue.message));
            }
            prompt.push_str("\nRepair constraints:\n");
            for constraint in &repair.constraints {
                prompt.push_str(&format!("- {constraint}\n"));
            }
        }

        prompt.push_str("\nReturn the corrected JSON query representation:");
        prompt
    }

    async fn request_completion(&self, body: &serde_json::Value) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let mut request = self
            .client
            .post(&url)
            .timeout(self.config.timeout)
            .json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                GenerationError::Timeout(self.config.timeout)
            } else {
                GenerationError::Transport(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Transport(format!(
                "generator endpoint returned {status}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Malformed(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::Empty)
    }
}

#[async_trait]
impl CandidateGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuerySpec, GenerationError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": self.system_prompt()},
                {"role": "user", "content": Self::user_prompt(request)},
            ],
        });

        // Transport failures are retried with exponential backoff; timeouts
        // and malformed payloads are not, since the attempt budget is the
        // orchestrator's to spend.
        let mut last_transport: Option<GenerationError> = None;
        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                let wait = std::time::Duration::from_secs(1 << (attempt - 1));
                warn!(attempt, ?wait, "generator transport failure, retrying");
                tokio::time::sleep(wait).await;
            }

            match self.request_completion(&body).await {
                Ok(content) => {
                    let cleaned = strip_code_fences(&content);
                    return serde_json::from_str::<QuerySpec>(cleaned)
                        .map_err(|err| GenerationError::Malformed(err.to_string()));
                }
                Err(err @ GenerationError::Transport(_)) => last_transport = Some(err),
                Err(err) => return Err(err),
            }
        }

        Err(last_transport.unwrap_or(GenerationError::Empty))
    }
}

/// Drops a surrounding markdown code fence, if the model added one despite
/// the json_object response format.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let fenced = "```json\n{\"tables\": []}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"tables\": []}");
    }

    #[test]
    fn strips_bare_fence() {
        let fenced = "```\n{}\n```";
        assert_eq!(strip_code_fences(fenced), "{}");
    }

    #[test]
    fn leaves_plain_json_alone() {
        assert_eq!(strip_code_fences(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn user_prompt_carries_repair_feedback() {
        use sqlgate_core::{Issue, IssueCode};

        let request = GenerationRequest {
            question: "top products".into(),
            page: 2,
            page_size: 25,
            repair: Some(super::super::RepairContext {
                failed_sql: "SELECT TOP 10 * FROM Production.Product".into(),
                issues: vec![Issue::error(IssueCode::NoOrderBy, "TOP requires ORDER BY")],
                constraints: vec!["Add an ORDER BY clause with a unique tiebreaker".into()],
            }),
        };

        let prompt = OpenAiGenerator::user_prompt(&request);
        assert!(prompt.contains("offset 25"));
        assert!(prompt.contains("E_NO_ORDER_BY"));
        assert!(prompt.contains("unique tiebreaker"));
    }
}
