//! Backend gateway contract.
//!
//! The backend AI/document-processing service is opaque to this crate
//! beyond the three operations below. Implementations live outside the
//! core (the HTTP implementation is in `docschat-interaction`); tests use
//! in-memory mocks.

use crate::document::DocumentFile;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An answer returned by the question endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text.
    pub text: String,
    /// Optional ordered citation labels.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

/// The three request/response operations exposed by the backend.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    /// Registers a document with the backend and returns its session
    /// identifier.
    async fn register_document(&self, file: &DocumentFile) -> Result<String>;

    /// Computes a single combined summary over the given session
    /// identifiers.
    async fn combined_summary(&self, session_ids: &[String]) -> Result<String>;

    /// Answers a question against the combined content of the given
    /// session identifiers.
    async fn answer_question(&self, session_ids: &[String], question: &str) -> Result<Answer>;
}
