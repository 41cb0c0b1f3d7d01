use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged utterance. Serializes to the `{role, content}` message shape
/// the chat-completion service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

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

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("message cannot be empty")]
    InvalidInput,
}

/// Ordered dialogue history for one session.
///
/// Element 0 is always the system turn handed to [`ConversationStore::init`].
/// Turns are only ever appended at the tail and are never edited in place; the
/// only removals are [`rollback_last_user`](Self::rollback_last_user) and
/// [`reset`](Self::reset), neither of which can touch the system turn.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn init(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    pub fn append_user(&mut self, text: &str) -> Result<(), ConversationError> {
        if text.trim().is_empty() {
            return Err(ConversationError::InvalidInput);
        }

        self.turns.push(Turn::user(text));
        Ok(())
    }

    /// Empty text is stored as-is: a reply with no content still occupies a turn.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    /// Drops the tail turn when it is an unanswered user turn. Returns whether
    /// anything was removed.
    pub fn rollback_last_user(&mut self) -> bool {
        let tail_is_user = self.turns.len() > 1
            && self
                .turns
                .last()
                .is_some_and(|turn| turn.role == Role::User);

        if tail_is_user {
            self.turns.pop();
        }
        tail_is_user
    }

    pub fn reset(&mut self) {
        self.turns.truncate(1);
    }

    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn system_prompt(&self) -> &str {
        self.turns
            .first()
            .map(|turn| turn.content.as_str())
            .unwrap_or_default()
    }
}
