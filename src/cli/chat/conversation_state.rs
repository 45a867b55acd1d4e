use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inference::{ExchangeError, ExchangeProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What a call to [`ConversationState::submit`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input or a request already in flight; nothing changed
    Ignored,
    Replied,
    Failed,
}

/// Message history plus the in-flight flag and last error.
///
/// Messages are append-only. A failed turn leaves its user message in place
/// and records the error instead of a reply.
#[derive(Debug, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    awaiting_response: bool,
    last_error: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn can_submit(&self, input: &str) -> bool {
        !self.awaiting_response && !input.trim().is_empty()
    }

    /// Start a turn: record the user message and mark a request in flight.
    /// Returns the text to send, or `None` if the input is rejected.
    pub fn begin_turn(&mut self, input: &str) -> Option<String> {
        if !self.can_submit(input) {
            return None;
        }

        self.awaiting_response = true;
        self.last_error = None;
        self.messages.push(Message::user(input));
        Some(input.to_string())
    }

    pub fn finish_turn(&mut self, result: Result<String, ExchangeError>) -> TurnOutcome {
        self.awaiting_response = false;

        match result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply));
                TurnOutcome::Replied
            }
            Err(e) => {
                self.last_error = Some(format!("Error: {}", e));
                TurnOutcome::Failed
            }
        }
    }

    /// Run one full turn against `provider`: at most one request is sent.
    pub async fn submit(
        &mut self,
        provider: &dyn ExchangeProvider,
        model_id: &str,
        input: &str,
    ) -> TurnOutcome {
        let Some(prompt) = self.begin_turn(input) else {
            debug!("Ignoring submit: blank input or request in flight");
            return TurnOutcome::Ignored;
        };

        let result = provider.exchange(&prompt, model_id).await;
        self.finish_turn(result)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_error = None;
    }
}
