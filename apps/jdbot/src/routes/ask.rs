use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
}

/// POST /api/v1/ask
///
/// Single-turn question: forwards one user message with no history and no session.
pub async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let reply = state
        .completion
        .complete(&[ChatMessage::user(request.content)])
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    Ok(Json(AskResponse { reply }))
}
