//! Multi-document session orchestration.
//!
//! This module contains the component that owns the authoritative list of
//! uploaded documents, their session identifiers, their transcripts, the
//! active selection, and the asynchronous workflows that keep the
//! backend-derived combined summary synchronized with that list.
//!
//! # Module Structure
//!
//! - `state`: Orchestrator-owned state and presentation snapshots
//! - The orchestrator itself (`SessionOrchestrator`) lives in this file

mod state;

pub use state::{
    DocumentSnapshot, StateSnapshot, SUMMARIZING_STATUS, SUMMARY_UNAVAILABLE, UPLOADING_STATUS,
};

use crate::document::{ChatMessage, Document, DocumentFile};
use crate::error::{DocsChatError, Result};
use crate::gateway::DocumentGateway;
use state::OrchestratorState;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};

/// Construction-time options for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Auto-select the most recent upload after a successful batch.
    ///
    /// Disabled in chat-only presentation modes where the surrounding
    /// context has already established the active document.
    pub auto_select_on_upload: bool,
    /// Deadline applied to every gateway call. Expiry is treated as a
    /// gateway failure, so phase flags can never stay raised forever.
    pub request_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            auto_select_on_upload: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of an upload batch.
///
/// Individual upload failures are absorbed (the batch never raises a
/// fatal error), but they are reported here so the presentation layer can
/// notify the user per file.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Number of documents successfully registered and appended.
    pub added: usize,
    /// Files whose registration failed, with the failure.
    pub failed: Vec<(String, DocsChatError)>,
}

/// Owns the canonical document list and the workflows that mutate it.
///
/// `SessionOrchestrator` is responsible for:
/// - Registering uploaded files with the backend, in submission order
/// - Tracking the active document selection
/// - Appending chat messages and routing assistant replies
/// - Keeping the combined summary consistent with the document set
///
/// One instance backs one browsing session; it is constructed explicitly
/// at session start and dropped at session end. All state is behind a
/// `RwLock` and mutated only by the operations below; consumers observe
/// it through immutable [`StateSnapshot`]s on the watch channel.
pub struct SessionOrchestrator {
    /// Authoritative orchestrator state.
    state: RwLock<OrchestratorState>,
    /// Backend gateway for registration, summary, and Q&A requests.
    gateway: Arc<dyn DocumentGateway>,
    /// Serializes combined-summary recomputes. Tokio mutexes queue
    /// fairly, so overlapping triggers resolve in trigger order.
    recompute_gate: Mutex<()>,
    /// Snapshot channel for the presentation layer.
    changes: watch::Sender<StateSnapshot>,
    options: OrchestratorOptions,
}

impl SessionOrchestrator {
    /// Creates an orchestrator with default options.
    pub fn new(gateway: Arc<dyn DocumentGateway>) -> Self {
        Self::with_options(gateway, OrchestratorOptions::default())
    }

    /// Creates an orchestrator with the given options.
    pub fn with_options(gateway: Arc<dyn DocumentGateway>, options: OrchestratorOptions) -> Self {
        let (changes, _) = watch::channel(StateSnapshot::default());
        Self {
            state: RwLock::new(OrchestratorState::default()),
            gateway,
            recompute_gate: Mutex::new(()),
            changes,
            options,
        }
    }

    /// Subscribes to state snapshots.
    ///
    /// A new snapshot is published after every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.changes.subscribe()
    }

    /// Returns the current state snapshot.
    pub async fn snapshot(&self) -> StateSnapshot {
        self.state.read().await.snapshot()
    }

    /// Registers a batch of validated files and appends the resulting
    /// documents.
    ///
    /// Files are registered *sequentially* so that documents appear in
    /// submission order regardless of individual network latency. An
    /// individual registration failure skips that file without aborting
    /// the rest of the batch. After the batch, the combined summary is
    /// recomputed over the full updated session-identifier set (skipped
    /// only when that set is empty).
    ///
    /// # Errors
    ///
    /// Never fails as a whole; per-file failures are carried in the
    /// returned [`UploadReport`].
    pub async fn add_documents(&self, files: Vec<DocumentFile>) -> Result<UploadReport> {
        self.set_upload_phase(true).await;

        let mut report = UploadReport::default();
        let mut new_docs = Vec::new();
        for file in files {
            match self
                .with_timeout(self.gateway.register_document(&file))
                .await
            {
                Ok(session_id) => {
                    tracing::debug!(
                        "[SessionOrchestrator] registered '{}' as session {}",
                        file.name,
                        session_id
                    );
                    new_docs.push(Document::new(file, session_id));
                }
                Err(err) => {
                    tracing::warn!(
                        "[SessionOrchestrator] upload failed for '{}': {}",
                        file.name,
                        err
                    );
                    report.failed.push((file.name, err));
                }
            }
        }
        report.added = new_docs.len();

        {
            let mut state = self.state.write().await;
            state.documents.extend(new_docs);
            if report.added > 0 && self.options.auto_select_on_upload {
                state.active_index = Some(state.documents.len() - 1);
            }
        }
        self.set_upload_phase(false).await;

        // Recompute over the full updated set, even if some uploads in
        // the batch failed, as long as any session identifier exists.
        if !self.state.read().await.documents.is_empty() {
            self.recompute_summary().await;
        }

        Ok(report)
    }

    /// Removes the document at `index` and recomputes the combined
    /// summary over the remaining set.
    ///
    /// The active selection is adjusted to keep pointing at the same
    /// logical document where possible: removing the active document
    /// reselects `max(0, index - 1)` (or clears the selection when no
    /// documents remain), and selections after the removed index shift
    /// down by one. Until the recompute resolves, the previous summary is
    /// retained (stale but never wrong); an empty remaining set clears
    /// the summary without a network call.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index` does not address a document.
    pub async fn remove_document(&self, index: usize) -> Result<()> {
        let remaining = {
            let mut state = self.state.write().await;
            let len = state.documents.len();
            if index >= len {
                return Err(DocsChatError::index_out_of_bounds(index, len));
            }
            state.documents.remove(index);

            state.active_index = match state.active_index {
                Some(active) if active == index => {
                    if state.documents.is_empty() {
                        None
                    } else {
                        Some(index.saturating_sub(1))
                    }
                }
                Some(active) if active > index => Some(active - 1),
                other => other,
            };
            state.documents.len()
        };
        self.publish().await;
        tracing::debug!(
            "[SessionOrchestrator] removed document {} ({} remaining)",
            index,
            remaining
        );

        self.recompute_summary().await;
        Ok(())
    }

    /// Sets the active document. No network effect.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index` does not address a document.
    pub async fn select_document(&self, index: usize) -> Result<()> {
        {
            let mut state = self.state.write().await;
            let len = state.documents.len();
            if index >= len {
                return Err(DocsChatError::index_out_of_bounds(index, len));
            }
            state.active_index = Some(index);
        }
        self.publish().await;
        Ok(())
    }

    /// Clears the active selection, returning to the home view.
    pub async fn go_home(&self) {
        self.state.write().await.active_index = None;
        self.publish().await;
    }

    /// Appends a message to the transcript of the document at `index`.
    ///
    /// Transcripts are append-only; existing entries are never mutated.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index` does not address a document.
    pub async fn append_message(&self, index: usize, message: ChatMessage) -> Result<()> {
        {
            let mut state = self.state.write().await;
            let len = state.documents.len();
            match state.documents.get_mut(index) {
                Some(doc) => doc.messages.push(message),
                None => return Err(DocsChatError::index_out_of_bounds(index, len)),
            }
        }
        self.publish().await;
        Ok(())
    }

    /// Sends a question about the combined content of all held documents.
    ///
    /// A no-op when the trimmed text is empty or no document is active.
    /// The user message is appended optimistically before the network
    /// call; the question is scoped to the session identifiers of *all*
    /// held documents, and the assistant reply targets the document that
    /// was active at submission time, even if the selection or the
    /// document set changes while the request is in flight. The target is
    /// pinned by session identifier, so a removal that shifts positions
    /// cannot redirect the reply to a different document. Chat activity
    /// never triggers a summary recompute.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure when the question request fails; no
    /// assistant message is appended in that case, so from the
    /// transcript's point of view the operation completes silently.
    pub async fn send_question(&self, text: &str) -> Result<()> {
        let question = text.trim().to_string();
        if question.is_empty() {
            return Ok(());
        }

        // Pin the reply target at submission time. Pinning by session id
        // keeps the target stable even when a removal shifts positions.
        let (target_session, session_ids) = {
            let mut state = self.state.write().await;
            let Some(target) = state.active_index else {
                return Ok(());
            };
            state.documents[target]
                .messages
                .push(ChatMessage::user(question.clone()));
            (
                state.documents[target].session_id.clone(),
                state.session_ids(),
            )
        };
        self.publish().await;

        let answer = self
            .with_timeout(self.gateway.answer_question(&session_ids, &question))
            .await?;

        {
            let mut state = self.state.write().await;
            match state
                .documents
                .iter_mut()
                .find(|doc| doc.session_id == target_session)
            {
                Some(doc) => doc
                    .messages
                    .push(ChatMessage::assistant(answer.text, answer.sources)),
                None => {
                    // The pinned document was removed mid-flight.
                    tracing::warn!(
                        "[SessionOrchestrator] dropping reply for removed session {}",
                        target_session
                    );
                }
            }
        }
        self.publish().await;
        Ok(())
    }

    /// Recomputes the combined summary over the current session-id set.
    ///
    /// Recomputes are serialized through `recompute_gate`: overlapping
    /// triggers (rapid successive removals, a second upload batch) queue
    /// and resolve in trigger order. An empty set clears the summary
    /// without touching the network; a gateway failure substitutes the
    /// fixed placeholder text.
    async fn recompute_summary(&self) {
        let _gate = self.recompute_gate.lock().await;

        let session_ids = self.state.read().await.session_ids();
        if session_ids.is_empty() {
            let mut state = self.state.write().await;
            state.combined_summary.clear();
            drop(state);
            self.publish().await;
            return;
        }

        self.set_summary_phase(true).await;
        let summary = match self
            .with_timeout(self.gateway.combined_summary(&session_ids))
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!("[SessionOrchestrator] summary recompute failed: {}", err);
                SUMMARY_UNAVAILABLE.to_string()
            }
        };

        {
            let mut state = self.state.write().await;
            state.combined_summary = summary;
        }
        self.set_summary_phase(false).await;
    }

    async fn set_upload_phase(&self, active: bool) {
        {
            let mut state = self.state.write().await;
            state.uploading = active;
            state.status_text = if active {
                UPLOADING_STATUS.to_string()
            } else {
                String::new()
            };
        }
        self.publish().await;
    }

    async fn set_summary_phase(&self, active: bool) {
        {
            let mut state = self.state.write().await;
            state.summarizing = active;
            state.status_text = if active {
                SUMMARIZING_STATUS.to_string()
            } else {
                String::new()
            };
        }
        self.publish().await;
    }

    /// Publishes a fresh snapshot to all subscribers.
    async fn publish(&self) {
        let snapshot = self.state.read().await.snapshot();
        self.changes.send_replace(snapshot);
    }

    /// Caps a gateway call with the configured request timeout.
    async fn with_timeout<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.options.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DocsChatError::Timeout {
                secs: self.options.request_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
