//! Axum route handlers for the chat session API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::result::MissingFields;
use crate::extraction::ErrorKind;
use crate::schema::CategorySchema;
use crate::session::engine::ExtractionSession;
use crate::session::models::{ConversationState, HistoryEntry, Mode};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// Full session view; the UI renders `history` in order, tagged by role.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub mode: Mode,
    pub history: Vec<HistoryEntry>,
    pub missing_fields: MissingFields,
}

impl SessionSnapshot {
    fn new(session_id: Uuid, state: &ConversationState) -> Self {
        Self {
            session_id,
            mode: state.mode,
            history: state.history.clone(),
            missing_fields: state.missing_fields.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
    pub mode: Mode,
    pub missing_fields: MissingFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/schema
pub async fn handle_get_schema(State(state): State<AppState>) -> Json<&'static [CategorySchema]> {
    Json(state.schema.categories())
}

/// POST /api/v1/sessions
///
/// Opens a session in AwaitingJobDescription with the welcome message in history.
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let (id, conversation) = state.sessions.create().await;
    let open_sessions = state.sessions.len().await;
    info!(
        session_id = %id,
        open_sessions,
        "Session created"
    );
    (
        StatusCode::CREATED,
        Json(SessionSnapshot::new(id, &conversation)),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let conversation = session.lock().await;
    Ok(Json(SessionSnapshot::new(id, &conversation)))
}

/// POST /api/v1/sessions/:id/messages
///
/// Processes one user turn. Completion failures are not HTTP errors: the
/// apology comes back as the reply with `error_kind` set.
pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let mut conversation = session.lock().await;

    let engine = ExtractionSession::new(
        state.completion.as_ref(),
        &state.schema,
        state.config.drift_policy,
    );
    let outcome = engine.handle_turn(&mut conversation, &request.content).await;

    Ok(Json(MessageResponse {
        reply: outcome.reply,
        mode: outcome.mode,
        missing_fields: conversation.missing_fields.clone(),
        error_kind: outcome.error,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    info!(session_id = %id, "Session ended");
    Ok(StatusCode::NO_CONTENT)
}
