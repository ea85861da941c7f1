//! Chat message types.
//!
//! This module contains types for representing turns in a document's
//! conversation, including roles and message content.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// A single turn in a document's conversation.
///
/// Each message has a role (user or assistant), content, a creation
/// timestamp, and, on assistant messages that reference source material,
/// an ordered list of citation labels. Messages are immutable once
/// appended to a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier within the owning transcript.
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
    /// Citation labels, present only on assistant messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl ChatMessage {
    /// Creates a user message with the given content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            sources: None,
        }
    }

    /// Creates an assistant message with the given content and optional
    /// citation labels.
    pub fn assistant(content: impl Into<String>, sources: Option<Vec<String>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            sources,
        }
    }
}
