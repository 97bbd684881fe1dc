use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// Session-local conversation with the tutor. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Starts a transcript with the assistant's greeting.
    #[must_use]
    pub fn with_welcome(welcome: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatRole::Assistant, welcome, at)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> &ChatMessage {
        self.push(ChatMessage::new(ChatRole::User, content, at))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> &ChatMessage {
        self.push(ChatMessage::new(ChatRole::Assistant, content, at))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
