use crate::api::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::types::{AnswerRequest, ChatRequest, InterruptResponse, SessionSummary};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

const CHAT_STREAM_PATH: &str = "/api/chat/stream";
const CHAT_ANSWER_PATH: &str = "/api/chat/answer";
const CHAT_SESSIONS_PATH: &str = "/api/chat/sessions";
const CHAT_INTERRUPT_PATH: &str = "/api/chat/interrupt";

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, endpoint: &str) -> Result<ByteStream>;

    fn interrupt(&self, _session_id: &str) -> Result<InterruptResponse> {
        Ok(InterruptResponse {
            success: true,
            message: "Session interrupted successfully".to_string(),
        })
    }
}

/// HTTP client for the agent platform backend.
///
/// Streaming endpoints return the raw byte stream; framing and event decode
/// live in [`crate::api::stream::StreamParser`]. Dropping a returned stream
/// aborts the underlying request.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(&config.base_url),
            #[cfg(test)]
            mock_stream_producer: None,
        }
    }

    #[cfg(test)]
    pub fn new_mock(producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://localhost:8000".to_string(),
            mock_stream_producer: Some(producer),
        }
    }

    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        self.open_stream(CHAT_STREAM_PATH, request).await
    }

    pub async fn answer_stream(&self, request: &AnswerRequest) -> Result<ByteStream> {
        self.open_stream(CHAT_ANSWER_PATH, request).await
    }

    async fn open_stream<T: Serialize>(&self, path: &str, payload: &T) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(path);
            }
        }

        let request_url = format!("{}{}", self.base_url, path);
        if debug_payload_enabled() {
            if let Ok(body) = serde_json::to_value(payload) {
                emit_debug_payload(&request_url, &body);
            }
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;

        let status = response.status();
        if !status.is_success() {
            // Fail fast before any frame is read; prefer the backend's own
            // error body over a bare status line.
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body)
                .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
            return Err(anyhow!(message));
        }

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    /// Server-side interrupt for a running session. Advisory: the stream may
    /// finish on its own before the backend acts on it.
    pub async fn interrupt(&self, session_id: &str) -> Result<InterruptResponse> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.interrupt(session_id);
            }
        }

        let request_url = format!("{}{}/{session_id}", self.base_url, CHAT_INTERRUPT_PATH);
        let response = self
            .http
            .post(&request_url)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_request_error(error, &request_url))?;
        Ok(response.json().await?)
    }

    pub async fn list_sessions(&self, agent_id: Option<&str>) -> Result<Vec<SessionSummary>> {
        let request_url = format!("{}{}", self.base_url, CHAT_SESSIONS_PATH);
        let mut request = self.http.get(&request_url);
        if let Some(agent_id) = agent_id {
            request = request.query(&[("agent_id", agent_id)]);
        }
        let response = request
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_request_error(error, &request_url))?;
        Ok(response.json().await?)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let request_url = format!("{}{}/{session_id}", self.base_url, CHAT_SESSIONS_PATH);
        self.http
            .delete(&request_url)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_request_error(error, &request_url))?;
        Ok(())
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() {
        return anyhow!(
            "cannot reach backend at '{}': {}. Start the backend or update ACHAT_BASE_URL.",
            request_url,
            error
        );
    }
    if error.is_timeout() {
        return anyhow!("request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "backend at '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("request to '{}' failed: {}", request_url, error)
}

/// Pull `detail` or `message` out of a JSON error body, if there is one.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "message"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}
