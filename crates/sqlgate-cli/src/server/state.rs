//! Shared application state for the server.
//!
//! State is assembled once at startup and shared across handlers via
//! `Arc`. Everything inside is immutable for the process lifetime: the
//! allowlist and limits are plain reads, and the generator/executor are
//! stateless clients, so handlers never lock.

use std::sync::Arc;

use crate::config::GateConfig;
use crate::exec::ExecutionBackend;
use crate::generator::{CandidateGenerator, SchemaContext};

pub struct AppState {
    pub config: GateConfig,
    /// Schema context handed to the generator, restricted to the allowlist.
    pub schema: SchemaContext,
    /// Absent when no generator endpoint is configured; /ask then returns
    /// a configuration error instead of generating.
    pub generator: Option<Arc<dyn CandidateGenerator>>,
    /// Absent in validate-only deployments; /ask then returns the
    /// validated SQL without rows.
    pub executor: Option<Arc<dyn ExecutionBackend>>,
}

impl AppState {
    pub fn new(
        config: GateConfig,
        schema: SchemaContext,
        generator: Option<Arc<dyn CandidateGenerator>>,
        executor: Option<Arc<dyn ExecutionBackend>>,
    ) -> Self {
        let schema = schema.restricted_to(&config.allowlist);
        Self {
            config,
            schema,
            generator,
            executor,
        }
    }
}
