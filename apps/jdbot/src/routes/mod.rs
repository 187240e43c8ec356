pub mod ask;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/schema", get(handlers::handle_get_schema))
        .route("/api/v1/ask", post(ask::handle_ask))
        // Chat sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_post_message),
        )
        .with_state(state)
}
