//! Chat scrollback types.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Bot,
    /// A failed bot call, shown inline.
    Error,
}

/// A single line in the chat scrollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Bounded chat scrollback.
///
/// `generation` changes whenever the transcript is reset. A reply that was
/// requested under an older generation is dropped instead of appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTranscript {
    generation: u64,
    messages: VecDeque<ChatMessage>,
}

impl ChatTranscript {
    /// Current generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Number of messages held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the scrollback is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, dropping the oldest ones beyond `limit`.
    pub fn push(&mut self, message: ChatMessage, limit: usize) {
        self.messages.push_back(message);
        while self.messages.len() > limit {
            self.messages.pop_front();
        }
    }

    /// Append a message only if the transcript is still on `generation`.
    ///
    /// Returns whether the message was applied.
    pub fn push_if_current(&mut self, generation: u64, message: ChatMessage, limit: usize) -> bool {
        if self.generation != generation {
            return false;
        }
        self.push(message, limit);
        true
    }

    /// Empty the scrollback and start a new generation.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}
