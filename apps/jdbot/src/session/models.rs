use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extraction::result::MissingFields;
use crate::llm_client::{ChatMessage, Role};
use crate::session::prompts::WELCOME_MESSAGE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Next user turn is treated as a job description to analyze.
    #[default]
    AwaitingJobDescription,
    /// Extraction succeeded; turns are free-form dialogue with full history.
    Conversational,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Everything one chat session knows. Owned by the session store, mutated one turn at a time.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    pub mode: Mode,
    pub history: Vec<HistoryEntry>,
    pub missing_fields: MissingFields,
    pub created_at: DateTime<Utc>,
    /// Time of the last recorded turn; drives idle eviction.
    pub last_active: DateTime<Utc>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    /// A fresh session, greeted with the welcome message.
    pub fn new() -> Self {
        let mut state = Self::empty();
        state.record(Role::Assistant, WELCOME_MESSAGE);
        state
    }

    /// A fresh session with no history at all.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            mode: Mode::AwaitingJobDescription,
            history: Vec::new(),
            missing_fields: MissingFields::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn record(&mut self, role: Role, content: impl Into<String>) {
        let now = Utc::now();
        self.history.push(HistoryEntry {
            role,
            content: content.into(),
            created_at: now,
        });
        self.last_active = now;
    }

    pub fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_active < cutoff
    }

    /// History in chronological order, as completion request messages.
    pub fn messages(&self) -> impl Iterator<Item = ChatMessage> + '_ {
        self.history
            .iter()
            .map(|entry| ChatMessage::new(entry.role, entry.content.clone()))
    }
}
