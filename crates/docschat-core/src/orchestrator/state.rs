//! Orchestrator-owned state and the immutable snapshots derived from it.

use crate::document::{ChatMessage, Document};
use serde::{Deserialize, Serialize};

/// Status text shown while an upload batch is in flight.
pub const UPLOADING_STATUS: &str = "Uploading...";

/// Status text shown while a combined-summary recompute is in flight.
pub const SUMMARIZING_STATUS: &str = "Generating summary...";

/// Placeholder substituted when the summary endpoint fails.
pub const SUMMARY_UNAVAILABLE: &str = "Summary not available.";

/// The authoritative state owned by the session orchestrator.
///
/// Invariants:
/// - `active_index`, when `Some`, is in bounds for `documents`.
/// - `documents` order equals upload submission order.
/// - `combined_summary` is eventually consistent with the session-id set
///   of `documents`; it may be transiently stale while a recompute is in
///   flight.
#[derive(Debug, Default)]
pub(crate) struct OrchestratorState {
    /// Uploaded documents, in upload order. Operations address documents
    /// by position, so index stability matters.
    pub documents: Vec<Document>,
    /// The currently selected document, or `None` for the home view.
    pub active_index: Option<usize>,
    /// Backend-derived synopsis over all held documents.
    pub combined_summary: String,
    /// An upload batch is in flight.
    pub uploading: bool,
    /// A combined-summary recompute is in flight.
    pub summarizing: bool,
    /// Human-readable status text for the in-flight phase.
    pub status_text: String,
}

impl OrchestratorState {
    /// Session identifiers of all held documents, in document order.
    pub fn session_ids(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|doc| doc.session_id.clone())
            .collect()
    }

    /// Derives the immutable snapshot handed to the presentation layer.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            documents: self.documents.iter().map(DocumentSnapshot::from).collect(),
            active_index: self.active_index,
            combined_summary: self.combined_summary.clone(),
            uploading: self.uploading,
            summarizing: self.summarizing,
            status_text: self.status_text.clone(),
        }
    }
}

/// Per-document view handed to the presentation layer.
///
/// Carries file metadata and the transcript but not the file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Original filename.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Backend-issued session identifier.
    pub session_id: String,
    /// The document's transcript, in insertion order.
    pub messages: Vec<ChatMessage>,
}

impl From<&Document> for DocumentSnapshot {
    fn from(doc: &Document) -> Self {
        Self {
            name: doc.file.name.clone(),
            size: doc.file.size,
            session_id: doc.session_id.clone(),
            messages: doc.messages.clone(),
        }
    }
}

/// Immutable per-render view of the orchestrator state.
///
/// Published on a watch channel after every mutation; the presentation
/// layer never mutates shared state directly, it only issues operations
/// back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Held documents with metadata and transcripts.
    pub documents: Vec<DocumentSnapshot>,
    /// The active document, or `None` for the home view.
    pub active_index: Option<usize>,
    /// Combined summary text ("" when no documents are held).
    pub combined_summary: String,
    /// An upload batch is in flight.
    pub uploading: bool,
    /// A combined-summary recompute is in flight.
    pub summarizing: bool,
    /// Status text for the in-flight phase ("" when idle).
    pub status_text: String,
}

impl StateSnapshot {
    /// True when the view shows the home/landing state.
    pub fn is_home(&self) -> bool {
        self.active_index.is_none()
    }

    /// The snapshot of the active document, if any.
    pub fn active_document(&self) -> Option<&DocumentSnapshot> {
        self.active_index.and_then(|i| self.documents.get(i))
    }
}
