//! Per-turn state: the append-only message list and the round state machine.
//!
//! ```text
//! Retrieving -> Inferring -> Dispatching -> Inferring -> ... -> Done | Exceeded | Failed
//! ```

use crate::backend::StopSignal;
use crate::error::{LlmError, TurnError};
use cookbook_conversation::{Message, ToolUse};
use cookbook_core::TurnId;
use std::fmt;

/// Messages exchanged during one turn. Grows by one message per step and never shrinks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Starts a turn with its first user message.
    #[must_use]
    pub fn new(initial: Message) -> Self {
        Self {
            messages: vec![initial],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// The assistant's reply to a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalAnswer {
    pub content: String,
}

impl FinalAnswer {
    /// Concatenates the text blocks of the final assistant message.
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        Self {
            content: message.text(),
        }
    }
}

impl fmt::Display for FinalAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Where a turn is in its round loop. Rounds are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    Retrieving,
    Inferring { round: u32 },
    Dispatching { round: u32, requests: Vec<ToolUse> },
    Done(FinalAnswer),
    Exceeded,
    Failed(LlmError),
}

impl TurnState {
    /// State after an inference round produced `message` with `stop`.
    #[must_use]
    pub fn after_inference(round: u32, message: &Message, stop: StopSignal) -> Self {
        match stop {
            StopSignal::Done => Self::Done(FinalAnswer::from_message(message)),
            StopSignal::ToolUseRequested => {
                let requests: Vec<ToolUse> = message.tool_uses().cloned().collect();
                if requests.is_empty() {
                    Self::Done(FinalAnswer::from_message(message))
                } else {
                    Self::Dispatching { round, requests }
                }
            }
        }
    }

    /// State after the tool results of `round` were appended.
    ///
    /// The last allowed round still runs its tools, but no further inference follows.
    #[must_use]
    pub fn after_dispatch(round: u32, max_rounds: u32) -> Self {
        if round >= max_rounds {
            Self::Exceeded
        } else {
            Self::Inferring { round: round + 1 }
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Exceeded | Self::Failed(_))
    }
}

/// Everything a finished turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub turn_id: TurnId,
    /// Inference rounds performed.
    pub rounds: u32,
    /// Tool invocations dispatched.
    pub tool_calls: usize,
    /// The full message list of the turn.
    pub messages: Vec<Message>,
    pub outcome: Result<FinalAnswer, TurnError>,
}

impl TurnReport {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.outcome.is_ok()
    }
}
