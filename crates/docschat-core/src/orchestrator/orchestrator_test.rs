use super::*;
use crate::document::{ACCEPTED_MIME_TYPE, MessageRole};
use crate::gateway::Answer;
use async_trait::async_trait;
use std::sync::Mutex as StdMutex;
use tokio::sync::Notify;

// Mock DocumentGateway for testing
#[derive(Default)]
struct MockGateway {
    /// Filenames whose registration fails
    fail_uploads: Vec<&'static str>,
    fail_summary: bool,
    fail_answer: bool,
    /// Answer requests never resolve (exercises the timeout path)
    hang_answer: bool,
    /// When set, answer requests block until the gate is notified
    answer_gate: Option<Arc<Notify>>,
    /// When set, summary requests block until the gate is notified,
    /// starting with call number `gate_summary_after`
    summary_gate: Option<Arc<Notify>>,
    gate_summary_after: usize,
    summary_calls: StdMutex<Vec<Vec<String>>>,
}

impl MockGateway {
    fn summary_calls(&self) -> Vec<Vec<String>> {
        self.summary_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentGateway for MockGateway {
    async fn register_document(&self, file: &DocumentFile) -> Result<String> {
        if self.fail_uploads.contains(&file.name.as_str()) {
            return Err(DocsChatError::gateway(500, "registration rejected"));
        }
        Ok(format!("sid-{}", file.name))
    }

    async fn combined_summary(&self, session_ids: &[String]) -> Result<String> {
        let call_index = {
            let mut calls = self.summary_calls.lock().unwrap();
            calls.push(session_ids.to_vec());
            calls.len() - 1
        };
        if let Some(gate) = &self.summary_gate {
            if call_index >= self.gate_summary_after {
                gate.notified().await;
            }
        }
        if self.fail_summary {
            return Err(DocsChatError::gateway(500, "summary rejected"));
        }
        Ok(format!("summary of {}", session_ids.join("+")))
    }

    async fn answer_question(&self, _session_ids: &[String], question: &str) -> Result<Answer> {
        if self.hang_answer {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.answer_gate {
            gate.notified().await;
        }
        if self.fail_answer {
            return Err(DocsChatError::gateway(500, "answer rejected"));
        }
        Ok(Answer {
            text: format!("answer to {}", question),
            sources: Some(vec!["[Document 1]".to_string()]),
        })
    }
}

fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, ACCEPTED_MIME_TYPE, vec![0u8; 16])
}

fn orchestrator(gateway: MockGateway) -> (Arc<SessionOrchestrator>, Arc<MockGateway>) {
    let gateway = Arc::new(gateway);
    let orch = Arc::new(SessionOrchestrator::new(gateway.clone()));
    (orch, gateway)
}

#[tokio::test]
async fn test_upload_preserves_submission_order() {
    let (orch, _) = orchestrator(MockGateway::default());

    let report = orch
        .add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();
    assert_eq!(report.added, 3);
    assert!(report.failed.is_empty());

    let snap = orch.snapshot().await;
    let names: Vec<&str> = snap.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    assert_eq!(snap.documents[0].session_id, "sid-a.pdf");
}

#[tokio::test]
async fn test_partial_upload_failure_is_isolated() {
    let (orch, _) = orchestrator(MockGateway {
        fail_uploads: vec!["b.pdf"],
        ..Default::default()
    });

    let report = orch
        .add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();
    assert_eq!(report.added, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "b.pdf");

    let snap = orch.snapshot().await;
    let names: Vec<&str> = snap.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "c.pdf"]);
}

#[tokio::test]
async fn test_upload_auto_selects_most_recent() {
    let (orch, _) = orchestrator(MockGateway::default());

    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf")])
        .await
        .unwrap();
    assert_eq!(orch.snapshot().await.active_index, Some(1));

    orch.add_documents(vec![pdf("c.pdf")]).await.unwrap();
    assert_eq!(orch.snapshot().await.active_index, Some(2));
}

#[tokio::test]
async fn test_auto_select_can_be_disabled() {
    let gateway = Arc::new(MockGateway::default());
    let orch = SessionOrchestrator::with_options(
        gateway,
        OrchestratorOptions {
            auto_select_on_upload: false,
            ..Default::default()
        },
    );

    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();
    let snap = orch.snapshot().await;
    assert_eq!(snap.active_index, None);
    assert!(snap.is_home());
}

#[tokio::test]
async fn test_upload_recomputes_summary_over_full_set() {
    let (orch, gateway) = orchestrator(MockGateway::default());

    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf")])
        .await
        .unwrap();

    let snap = orch.snapshot().await;
    assert_eq!(snap.combined_summary, "summary of sid-a.pdf+sid-b.pdf");
    assert_eq!(
        gateway.summary_calls(),
        vec![vec!["sid-a.pdf".to_string(), "sid-b.pdf".to_string()]]
    );
    assert!(!snap.uploading);
    assert!(!snap.summarizing);
    assert!(snap.status_text.is_empty());
}

#[tokio::test]
async fn test_all_uploads_failing_skips_recompute() {
    let (orch, gateway) = orchestrator(MockGateway {
        fail_uploads: vec!["a.pdf", "b.pdf"],
        ..Default::default()
    });

    let report = orch
        .add_documents(vec![pdf("a.pdf"), pdf("b.pdf")])
        .await
        .unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.failed.len(), 2);
    assert!(gateway.summary_calls().is_empty());
    assert_eq!(orch.snapshot().await.combined_summary, "");
}

#[tokio::test]
async fn test_summary_failure_substitutes_placeholder() {
    let (orch, _) = orchestrator(MockGateway {
        fail_summary: true,
        ..Default::default()
    });

    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();
    let snap = orch.snapshot().await;
    assert_eq!(snap.combined_summary, SUMMARY_UNAVAILABLE);
    assert!(!snap.summarizing);
}

#[tokio::test]
async fn test_removal_keeps_active_pointing_at_same_document() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();
    orch.select_document(2).await.unwrap();

    orch.remove_document(0).await.unwrap();

    let snap = orch.snapshot().await;
    let names: Vec<&str> = snap.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["b.pdf", "c.pdf"]);
    assert_eq!(snap.active_index, Some(1));
    assert_eq!(snap.active_document().unwrap().name, "c.pdf");
}

#[tokio::test]
async fn test_removing_active_document_reselects_previous() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();
    orch.select_document(1).await.unwrap();

    orch.remove_document(1).await.unwrap();

    let snap = orch.snapshot().await;
    let names: Vec<&str> = snap.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "c.pdf"]);
    assert_eq!(snap.active_index, Some(0));
}

#[tokio::test]
async fn test_selection_before_removed_index_is_unchanged() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();
    orch.select_document(0).await.unwrap();

    orch.remove_document(2).await.unwrap();

    assert_eq!(orch.snapshot().await.active_index, Some(0));
}

#[tokio::test]
async fn test_removing_last_document_clears_summary() {
    let (orch, gateway) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();
    assert!(!orch.snapshot().await.combined_summary.is_empty());

    orch.remove_document(0).await.unwrap();

    let snap = orch.snapshot().await;
    // Empty, not the placeholder: there is nothing left to summarize.
    assert_eq!(snap.combined_summary, "");
    assert_eq!(snap.active_index, None);
    // Only the upload triggered a summary request.
    assert_eq!(gateway.summary_calls().len(), 1);
}

#[tokio::test]
async fn test_successive_removals_recompute_in_order() {
    let (orch, gateway) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();

    orch.remove_document(0).await.unwrap();
    orch.remove_document(0).await.unwrap();

    let calls = gateway.summary_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1], vec!["sid-b.pdf".to_string(), "sid-c.pdf".to_string()]);
    assert_eq!(calls[2], vec!["sid-c.pdf".to_string()]);
    assert_eq!(orch.snapshot().await.combined_summary, "summary of sid-c.pdf");
}

#[tokio::test]
async fn test_overlapping_removals_queue_recomputes() {
    let gate = Arc::new(Notify::new());
    let (orch, gateway) = orchestrator(MockGateway {
        summary_gate: Some(gate.clone()),
        // Let the upload's recompute through; gate the removal ones.
        gate_summary_after: 1,
        ..Default::default()
    });
    orch.add_documents(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")])
        .await
        .unwrap();

    let mut rx = orch.subscribe();

    // First removal: its recompute starts and blocks at the gate while
    // holding the recompute lock.
    let first = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.remove_document(0).await })
    };
    rx.wait_for(|snap| snap.documents.len() == 2 && snap.summarizing)
        .await
        .unwrap();

    // Second removal while the first recompute is still in flight: its
    // state mutation lands immediately, its recompute queues.
    let second = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.remove_document(0).await })
    };
    rx.wait_for(|snap| snap.documents.len() == 1).await.unwrap();

    gate.notify_one();
    gate.notify_one();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // The recomputes ran one at a time, in trigger order, each over the
    // set current when it started; the last-triggered one wins.
    let calls = gateway.summary_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1], vec!["sid-b.pdf".to_string(), "sid-c.pdf".to_string()]);
    assert_eq!(calls[2], vec!["sid-c.pdf".to_string()]);
    assert_eq!(orch.snapshot().await.combined_summary, "summary of sid-c.pdf");
}

#[tokio::test]
async fn test_remove_rejects_out_of_bounds_index() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();

    let err = orch.remove_document(1).await.unwrap_err();
    assert!(matches!(err, DocsChatError::IndexOutOfBounds { index: 1, len: 1 }));

    let err = orch.select_document(5).await.unwrap_err();
    assert!(matches!(err, DocsChatError::IndexOutOfBounds { index: 5, .. }));
}

#[tokio::test]
async fn test_send_question_appends_user_then_assistant() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();

    orch.send_question("  what is this?  ").await.unwrap();

    let snap = orch.snapshot().await;
    let messages = &snap.documents[0].messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "what is this?");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "answer to what is this?");
    assert_eq!(
        messages[1].sources.as_deref(),
        Some(&["[Document 1]".to_string()][..])
    );
}

#[tokio::test]
async fn test_blank_question_is_a_noop() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();

    orch.send_question("   ").await.unwrap();

    assert!(orch.snapshot().await.documents[0].messages.is_empty());
}

#[tokio::test]
async fn test_question_without_active_document_is_a_noop() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();
    orch.go_home().await;

    orch.send_question("hello?").await.unwrap();

    assert!(orch.snapshot().await.documents[0].messages.is_empty());
}

#[tokio::test]
async fn test_failed_question_leaves_only_user_message() {
    let (orch, _) = orchestrator(MockGateway {
        fail_answer: true,
        ..Default::default()
    });
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();

    let err = orch.send_question("anything?").await.unwrap_err();
    assert!(err.is_gateway_failure());

    let messages = &orch.snapshot().await.documents[0].messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_reply_targets_document_active_at_submission() {
    let gate = Arc::new(Notify::new());
    let (orch, _) = orchestrator(MockGateway {
        answer_gate: Some(gate.clone()),
        ..Default::default()
    });
    orch.add_documents(vec![pdf("x.pdf"), pdf("y.pdf")])
        .await
        .unwrap();
    orch.select_document(0).await.unwrap();

    let mut rx = orch.subscribe();
    let sender = orch.clone();
    let task = tokio::spawn(async move { sender.send_question("pinned?").await });

    // Wait for the optimistic user message to land, then switch the
    // active document while the answer is still in flight.
    rx.wait_for(|snap| !snap.documents[0].messages.is_empty())
        .await
        .unwrap();
    orch.select_document(1).await.unwrap();
    gate.notify_one();
    task.await.unwrap().unwrap();

    let snap = orch.snapshot().await;
    assert_eq!(snap.active_index, Some(1));
    // The reply landed in x.pdf, which was active at submission time.
    assert_eq!(snap.documents[0].messages.len(), 2);
    assert_eq!(snap.documents[0].messages[1].role, MessageRole::Assistant);
    assert!(snap.documents[1].messages.is_empty());
}

#[tokio::test]
async fn test_reply_not_redirected_when_removal_shifts_indices() {
    let gate = Arc::new(Notify::new());
    let (orch, _) = orchestrator(MockGateway {
        answer_gate: Some(gate.clone()),
        ..Default::default()
    });
    orch.add_documents(vec![pdf("x.pdf"), pdf("y.pdf")])
        .await
        .unwrap();
    orch.select_document(0).await.unwrap();

    let mut rx = orch.subscribe();
    let sender = orch.clone();
    let task = tokio::spawn(async move { sender.send_question("about x?").await });

    rx.wait_for(|snap| !snap.documents[0].messages.is_empty())
        .await
        .unwrap();
    // Removing x.pdf shifts y.pdf into the pinned position while the
    // answer is still in flight.
    orch.remove_document(0).await.unwrap();
    gate.notify_one();
    task.await.unwrap().unwrap();

    let snap = orch.snapshot().await;
    assert_eq!(snap.documents.len(), 1);
    assert_eq!(snap.documents[0].name, "y.pdf");
    // The reply belonged to the removed document and must be dropped,
    // not appended to the document now occupying its old index.
    assert!(snap.documents[0].messages.is_empty());
}

#[tokio::test]
async fn test_reply_for_removed_document_is_dropped() {
    let gate = Arc::new(Notify::new());
    let (orch, _) = orchestrator(MockGateway {
        answer_gate: Some(gate.clone()),
        ..Default::default()
    });
    orch.add_documents(vec![pdf("x.pdf")]).await.unwrap();

    let mut rx = orch.subscribe();
    let sender = orch.clone();
    let task = tokio::spawn(async move { sender.send_question("gone?").await });

    rx.wait_for(|snap| !snap.documents[0].messages.is_empty())
        .await
        .unwrap();
    orch.remove_document(0).await.unwrap();
    gate.notify_one();
    task.await.unwrap().unwrap();

    let snap = orch.snapshot().await;
    assert!(snap.documents.is_empty());
}

#[tokio::test]
async fn test_append_is_monotonic_and_immutable() {
    let (orch, _) = orchestrator(MockGateway::default());
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();

    orch.append_message(0, ChatMessage::user("first")).await.unwrap();
    let before = orch.snapshot().await.documents[0].messages.clone();

    orch.append_message(0, ChatMessage::assistant("second", None))
        .await
        .unwrap();
    let after = orch.snapshot().await.documents[0].messages.clone();

    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
}

#[tokio::test]
async fn test_question_timeout_maps_to_failure() {
    let gateway = Arc::new(MockGateway {
        hang_answer: true,
        ..Default::default()
    });
    let orch = SessionOrchestrator::with_options(
        gateway,
        OrchestratorOptions {
            request_timeout: Duration::from_millis(20),
            ..Default::default()
        },
    );
    orch.add_documents(vec![pdf("a.pdf")]).await.unwrap();

    let err = orch.send_question("slow?").await.unwrap_err();
    assert!(matches!(err, DocsChatError::Timeout { .. }));

    // The phase flags are idle again; only the user message remains.
    let snap = orch.snapshot().await;
    assert!(!snap.uploading && !snap.summarizing);
    assert_eq!(snap.documents[0].messages.len(), 1);
}
