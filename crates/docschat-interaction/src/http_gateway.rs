//! HTTP implementation of the backend gateway contract.
//!
//! Talks to the document-chat backend over three endpoints:
//! `/upload` (multipart registration), `/summary-multi` (combined
//! summary), and `/chat-multi` (cross-document Q&A).

use async_trait::async_trait;
use docschat_core::document::DocumentFile;
use docschat_core::error::{DocsChatError, Result};
use docschat_core::gateway::{Answer, DocumentGateway};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BackendConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    session_id: String,
    // Per-document summary computed at upload time; the orchestrator
    // derives its own combined summary, so this field is unused.
    #[serde(default)]
    #[allow(dead_code)]
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    session_ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    session_ids: &'a [String],
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
    #[serde(default)]
    sources: Option<Vec<String>>,
}

/// Gateway implementation that talks to the backend over HTTP.
#[derive(Clone)]
pub struct HttpDocumentGateway {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpDocumentGateway {
    /// Creates a gateway from the given configuration.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Maps a non-success response to a gateway error, preserving the
    /// response body when it is readable.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(DocsChatError::gateway(status.as_u16(), detail))
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> DocsChatError {
    DocsChatError::Transport(format!("{}: {}", context, err))
}

#[async_trait]
impl DocumentGateway for HttpDocumentGateway {
    async fn register_document(&self, file: &DocumentFile) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(file.data.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| transport_error("invalid upload content type", e))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        tracing::debug!("[HttpDocumentGateway] uploading '{}'", file.name);
        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport_error("upload request failed", e))?;

        let body: UploadResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("failed to parse upload response", e))?;
        Ok(body.session_id)
    }

    async fn combined_summary(&self, session_ids: &[String]) -> Result<String> {
        tracing::debug!(
            "[HttpDocumentGateway] requesting combined summary for {} sessions",
            session_ids.len()
        );
        let response = self
            .client
            .post(self.endpoint("summary-multi"))
            .json(&SummaryRequest { session_ids })
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport_error("summary request failed", e))?;

        let body: SummaryResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("failed to parse summary response", e))?;
        Ok(body.summary)
    }

    async fn answer_question(&self, session_ids: &[String], question: &str) -> Result<Answer> {
        tracing::debug!(
            "[HttpDocumentGateway] asking question over {} sessions",
            session_ids.len()
        );
        let response = self
            .client
            .post(self.endpoint("chat-multi"))
            .json(&ChatRequest {
                session_ids,
                question,
            })
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport_error("chat request failed", e))?;

        let body: ChatResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("failed to parse chat response", e))?;
        Ok(Answer {
            text: body.answer,
            sources: body.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let gateway =
            HttpDocumentGateway::new(&BackendConfig::default().with_base_url("http://host:8000/"));
        assert_eq!(gateway.endpoint("upload"), "http://host:8000/upload");
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(ChatRequest {
            session_ids: &ids,
            question: "what?",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "session_ids": ["a", "b"], "question": "what?" })
        );
    }

    #[test]
    fn test_chat_response_sources_are_optional() {
        let body: ChatResponse = serde_json::from_str(r#"{ "answer": "42" }"#).unwrap();
        assert_eq!(body.answer, "42");
        assert!(body.sources.is_none());
    }

    #[test]
    fn test_upload_response_tolerates_missing_summary() {
        let body: UploadResponse = serde_json::from_str(r#"{ "session_id": "s1" }"#).unwrap();
        assert_eq!(body.session_id, "s1");
    }
}
