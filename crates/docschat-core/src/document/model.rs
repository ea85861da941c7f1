//! Document domain model.
//!
//! This module contains the core `Document` entity: one uploaded file,
//! its backend-issued session identifier, and its conversation transcript.

use super::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// An uploaded file handle as supplied by the user.
///
/// Immutable after creation. The binary content is carried so the gateway
/// can register the document; the orchestrator itself never inspects it
/// (no client-side parsing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    /// Original filename
    pub name: String,
    /// Declared MIME type of the file
    pub mime_type: String,
    /// File size in bytes
    pub size: u64,
    /// Raw file content
    #[serde(default, skip_serializing)]
    pub data: Vec<u8>,
}

impl DocumentFile {
    /// Creates a file handle from raw bytes, deriving the size field.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: data.len() as u64,
            data,
        }
    }
}

/// Represents one uploaded document and its conversation.
///
/// A document is created when a file passes validation and its upload
/// request succeeds. After creation it is mutated only by appending
/// messages to its transcript, and destroyed only by explicit removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The file this document was created from.
    pub file: DocumentFile,
    /// Backend-issued session identifier, unique among held documents.
    pub session_id: String,
    /// Chronological, append-only conversation transcript.
    pub messages: Vec<ChatMessage>,
}

impl Document {
    /// Creates a document with an empty transcript.
    pub fn new(file: DocumentFile, session_id: impl Into<String>) -> Self {
        Self {
            file,
            session_id: session_id.into(),
            messages: Vec::new(),
        }
    }
}
