// Chat session: per-session conversation state, the turn engine, the
// in-memory store and the HTTP handlers on top of them.
// All completion calls go through llm_client::CompletionService.

pub mod engine;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod store;
