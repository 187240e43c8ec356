//! Turn processing for the two-state chat loop.
//!
//! AwaitingJobDescription: the turn is analyzed as a job description. Success
//! stores the missing fields and moves to Conversational; failure leaves the
//! mode unchanged.
//!
//! Conversational: the turn is forwarded with the system instruction and the
//! full history. There is no way back to AwaitingJobDescription.
//!
//! Both the user turn and the assistant reply (or apology) are recorded. A raw
//! reply that failed to parse is never recorded.

use tracing::{error, info, warn};

use crate::extraction::render::render_analysis_reply;
use crate::extraction::validation::DriftPolicy;
use crate::extraction::{extract, ErrorKind, ExtractionError};
use crate::llm_client::{ChatMessage, CompletionService, Role};
use crate::schema::FieldSchema;
use crate::session::models::{ConversationState, Mode};
use crate::session::prompts::{ANALYSIS_APOLOGY, CONVERSATION_APOLOGY, CONVERSATION_SYSTEM};

/// What one user turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub mode: Mode,
    pub error: Option<ErrorKind>,
}

/// Drives a `ConversationState` through user turns.
pub struct ExtractionSession<'a> {
    completion: &'a dyn CompletionService,
    schema: &'a FieldSchema,
    policy: DriftPolicy,
}

impl<'a> ExtractionSession<'a> {
    pub fn new(
        completion: &'a dyn CompletionService,
        schema: &'a FieldSchema,
        policy: DriftPolicy,
    ) -> Self {
        Self {
            completion,
            schema,
            policy,
        }
    }

    pub async fn handle_turn(&self, state: &mut ConversationState, text: &str) -> TurnOutcome {
        match state.mode {
            Mode::AwaitingJobDescription => self.analyze_turn(state, text).await,
            Mode::Conversational => self.conversation_turn(state, text).await,
        }
    }

    async fn analyze_turn(&self, state: &mut ConversationState, text: &str) -> TurnOutcome {
        state.record(Role::User, text);

        let (reply, error) = match extract(text, self.completion, self.schema, self.policy).await
        {
            Ok(result) => {
                info!(
                    found = result.found_count(),
                    missing = result.missing_fields.field_count(),
                    "Job description analyzed"
                );
                let reply = render_analysis_reply(&result, self.schema);
                state.missing_fields = result.missing_fields;
                state.mode = Mode::Conversational;
                (reply, None)
            }
            Err(e) => {
                match &e {
                    ExtractionError::ServiceError(inner) => {
                        error!("Extraction call failed: {inner}")
                    }
                    other => warn!("Extraction reply rejected: {other}"),
                }
                (format!("{ANALYSIS_APOLOGY} Error: {e}"), Some(e.kind()))
            }
        };

        state.record(Role::Assistant, reply.clone());
        TurnOutcome {
            reply,
            mode: state.mode,
            error,
        }
    }

    async fn conversation_turn(&self, state: &mut ConversationState, text: &str) -> TurnOutcome {
        let messages: Vec<ChatMessage> = std::iter::once(ChatMessage::system(CONVERSATION_SYSTEM))
            .chain(state.messages())
            .chain(std::iter::once(ChatMessage::user(text)))
            .collect();
        state.record(Role::User, text);

        let (reply, error) = match self.completion.complete(&messages).await {
            Ok(reply) => (reply, None),
            Err(e) => {
                error!("Conversational call failed: {e}");
                (
                    format!("{CONVERSATION_APOLOGY} Error: {e}"),
                    Some(ErrorKind::ServiceError),
                )
            }
        };

        state.record(Role::Assistant, reply.clone());
        TurnOutcome {
            reply,
            mode: state.mode,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCompletion;
    use crate::llm_client::LlmError;

    const SCENARIO_REPLY: &str = r#"{"found_fields": {"Position Details": {"Engagement Type": "Full-time"}}, "missing_fields": {"Customer Details": ["Customer", "Hiring Manager"]}}"#;

    fn run<'a>(completion: &'a ScriptedCompletion, schema: &'a FieldSchema) -> ExtractionSession<'a> {
        ExtractionSession::new(completion, schema, DriftPolicy::Reconcile)
    }

    #[tokio::test]
    async fn test_successful_analysis_moves_to_conversational() {
        let completion = ScriptedCompletion::new().reply(SCENARIO_REPLY);
        let schema = FieldSchema::recruiting();
        let mut state = ConversationState::new();

        let outcome = run(&completion, &schema)
            .handle_turn(&mut state, "Senior Go engineer, remote, full-time")
            .await;

        assert_eq!(outcome.mode, Mode::Conversational);
        assert_eq!(state.mode, Mode::Conversational);
        assert!(outcome.error.is_none());
        assert!(outcome
            .reply
            .contains("Position Details:\n- Engagement Type: Full-time\n"));
        assert!(outcome.reply.contains(
            "In the Customer Details category, we're missing:\n- Customer\n- Hiring Manager\n"
        ));
        assert!(state.missing_fields.contains("Customer Details", "Hiring Manager"));

        // welcome, user turn, assistant reply
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history[1].role, Role::User);
        assert_eq!(state.history[1].content, "Senior Go engineer, remote, full-time");
        assert_eq!(state.history[2].content, outcome.reply);
    }

    #[tokio::test]
    async fn test_unparseable_reply_keeps_awaiting() {
        let completion = ScriptedCompletion::new().reply("not json");
        let schema = FieldSchema::recruiting();
        let mut state = ConversationState::new();

        let outcome = run(&completion, &schema)
            .handle_turn(&mut state, "Senior Go engineer")
            .await;

        assert_eq!(outcome.mode, Mode::AwaitingJobDescription);
        assert_eq!(state.mode, Mode::AwaitingJobDescription);
        assert_eq!(outcome.error, Some(ErrorKind::MalformedResponse));
        assert!(outcome
            .reply
            .starts_with("Sorry, I had trouble analyzing the job description. Error: "));
        assert!(outcome.reply.contains("expected"));
        assert!(state.missing_fields.is_empty());

        // the apology is recorded, the raw reply is not
        assert_eq!(state.history.len(), 3);
        assert!(state.history.iter().all(|h| h.content != "not json"));
        assert_eq!(state.history[2].content, outcome.reply);
    }

    #[tokio::test]
    async fn test_failed_analysis_can_be_retried() {
        let completion = ScriptedCompletion::new()
            .fail(LlmError::RateLimited { retries: 3 })
            .reply(SCENARIO_REPLY);
        let schema = FieldSchema::recruiting();
        let mut state = ConversationState::new();
        let session = run(&completion, &schema);

        let first = session.handle_turn(&mut state, "Senior Go engineer").await;
        assert_eq!(first.error, Some(ErrorKind::ServiceError));
        assert!(first.reply.contains("Rate limited after 3 retries"));

        let second = session.handle_turn(&mut state, "Senior Go engineer").await;
        assert_eq!(second.mode, Mode::Conversational);

        // both attempts were extraction requests with no history
        let calls = completion.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.len() == 1));
    }

    #[tokio::test]
    async fn test_conversation_sends_system_history_and_new_turn() {
        let completion = ScriptedCompletion::new().reply("You still need a hiring manager.");
        let schema = FieldSchema::recruiting();
        let mut state = ConversationState::empty();
        state.mode = Mode::Conversational;
        state.record(Role::User, "hi");
        state.record(Role::Assistant, "hello");

        let outcome = run(&completion, &schema)
            .handle_turn(&mut state, "what's missing?")
            .await;

        assert_eq!(outcome.reply, "You still need a hiring manager.");
        assert_eq!(outcome.mode, Mode::Conversational);

        let calls = completion.calls();
        assert_eq!(
            calls[0],
            vec![
                ChatMessage::system(CONVERSATION_SYSTEM),
                ChatMessage::user("hi"),
                ChatMessage::new(Role::Assistant, "hello"),
                ChatMessage::user("what's missing?"),
            ]
        );
        assert_eq!(state.history.len(), 4);
        assert_eq!(state.history[3].content, "You still need a hiring manager.");
    }

    #[tokio::test]
    async fn test_conversation_never_reruns_extraction() {
        let completion = ScriptedCompletion::new()
            .reply(SCENARIO_REPLY)
            .reply(SCENARIO_REPLY);
        let schema = FieldSchema::recruiting();
        let mut state = ConversationState::new();
        let session = run(&completion, &schema);

        session.handle_turn(&mut state, "Senior Go engineer").await;
        let second = session
            .handle_turn(&mut state, "Another job description entirely")
            .await;

        // second reply is passed through verbatim, not parsed
        assert_eq!(second.reply, SCENARIO_REPLY);
        assert_eq!(second.mode, Mode::Conversational);
        assert_eq!(completion.calls()[1][0].role, Role::System);
    }

    #[tokio::test]
    async fn test_conversation_failure_is_not_fatal() {
        let completion = ScriptedCompletion::new()
            .fail(LlmError::EmptyContent)
            .reply("Back again.");
        let schema = FieldSchema::recruiting();
        let mut state = ConversationState::empty();
        state.mode = Mode::Conversational;
        let session = run(&completion, &schema);

        let failed = session.handle_turn(&mut state, "hello?").await;
        assert_eq!(failed.error, Some(ErrorKind::ServiceError));
        assert!(failed.reply.starts_with(CONVERSATION_APOLOGY));
        assert_eq!(state.mode, Mode::Conversational);

        let next = session.handle_turn(&mut state, "hello?").await;
        assert_eq!(next.reply, "Back again.");
        // history carried the failed exchange into the next request
        assert_eq!(completion.calls()[1].len(), 4);
    }
}
