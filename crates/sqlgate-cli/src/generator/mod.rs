//! Candidate-generator collaborator interface.
//!
//! The generator is external: it consumes a natural-language question plus
//! schema context and produces a [`QuerySpec`], never SQL text. Everything
//! it returns goes through the renderer and the validator before any
//! database can see it.

pub mod openai;
pub mod schema;

use async_trait::async_trait;
use sqlgate_core::{Issue, QuerySpec};
use std::time::Duration;
use thiserror::Error;

pub use openai::OpenAiGenerator;
pub use schema::{SchemaContext, SchemaTable};

/// One generation request. Repair rounds carry the previous failure so the
/// generator can correct it; there is no other cross-call memory.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub question: String,
    /// 1-based result page.
    pub page: u32,
    pub page_size: u32,
    pub repair: Option<RepairContext>,
}

/// Feedback from a failed validation, handed back to the generator.
#[derive(Debug, Clone)]
pub struct RepairContext {
    pub failed_sql: String,
    pub issues: Vec<Issue>,
    /// One derived constraint per distinct issue code.
    pub constraints: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generator transport failure: {0}")]
    Transport(String),

    #[error("generator returned malformed output: {0}")]
    Malformed(String),

    #[error("generator returned an empty response")]
    Empty,
}

/// A service that turns questions into query representations.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuerySpec, GenerationError>;
}
