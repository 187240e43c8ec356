//! Turns raw job-description text into found / missing field sets.
//!
//! Flow: build prompt from the schema → one completion call (no history) →
//!       parse `found_fields` / `missing_fields` → validate against the schema.

pub mod prompts;
pub mod render;
pub mod result;
pub mod validation;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::extraction::prompts::EXTRACTION_PROMPT_TEMPLATE;
use crate::extraction::result::ExtractionResult;
use crate::extraction::validation::{validate, DriftPolicy};
use crate::llm_client::{ChatMessage, CompletionService, LlmError};
use crate::schema::FieldSchema;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{0}")]
    ServiceError(#[from] LlmError),

    #[error("{0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("reply names fields outside the schema: {}", .0.join(", "))]
    SchemaDrift(Vec<String>),
}

/// Machine-readable error category reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ServiceError,
    MalformedResponse,
    SchemaDrift,
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::ServiceError(_) => ErrorKind::ServiceError,
            ExtractionError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ExtractionError::SchemaDrift(_) => ErrorKind::SchemaDrift,
        }
    }
}

/// Builds the single instruction string sent for extraction.
pub fn build_extraction_prompt(jd_text: &str, schema: &FieldSchema) -> String {
    // schema first so placeholder-looking text inside the JD stays literal
    EXTRACTION_PROMPT_TEMPLATE
        .replace("{schema}", &schema.describe())
        .replace("{jd_text}", jd_text)
}

/// Parses and validates a raw extraction reply.
pub fn analyze_reply(
    raw: &str,
    schema: &FieldSchema,
    policy: DriftPolicy,
) -> Result<ExtractionResult, ExtractionError> {
    let parsed = ExtractionResult::from_reply(raw)?;
    validate(parsed, schema, policy)
}

/// Runs one extraction against the completion service.
pub async fn extract(
    jd_text: &str,
    completion: &dyn CompletionService,
    schema: &FieldSchema,
    policy: DriftPolicy,
) -> Result<ExtractionResult, ExtractionError> {
    let prompt = build_extraction_prompt(jd_text, schema);
    let raw = completion.complete(&[ChatMessage::user(prompt)]).await?;
    debug!("Extraction reply received ({} chars)", raw.len());
    analyze_reply(&raw, schema, policy)
}
