//! HttpChatBackend - REST transport to the agent coordination service.
//!
//! One POST per chat request, JSON both ways. Everything that keeps the
//! reply from being decoded is a [`TransportError`]; a well-formed reply
//! with `success = false` is backend data and maps to
//! [`BackendReply::Failure`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use uplink_core::backend::{ChatBackend, ChatRequest};
use uplink_core::error::TransportError;
use uplink_core::workflow::{BackendReply, WorkflowEvent, WorkflowResult};

use crate::config::BackendConfig;

/// Backend client that POSTs chat requests to the coordination service.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpChatBackend {
    /// Creates a client for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout: BackendConfig::default().timeout(),
        }
    }

    /// Creates a client from a loaded [`BackendConfig`].
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.endpoint.clone()).with_timeout(config.timeout())
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send_chat(&self, request: ChatRequest) -> Result<BackendReply, TransportError> {
        let body = ChatRequestDto {
            message: &request.message,
            agent: request.agent.map(|agent| agent.key()),
        };

        tracing::debug!(
            "[HttpChatBackend] POST {} (agent: {})",
            self.endpoint,
            body.agent.unwrap_or("null")
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatResponseDto = response
            .json()
            .await
            .map_err(|err| TransportError::Malformed(err.to_string()))?;

        tracing::debug!("[HttpChatBackend] Response decoded (success: {})", parsed.success);
        Ok(parsed.into_reply())
    }
}

#[derive(Serialize)]
struct ChatRequestDto<'a> {
    message: &'a str,
    // Serialized as null when unfocused, matching the wire contract
    agent: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponseDto {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    workflow_logs: Vec<WorkflowLogDto>,
    #[serde(default)]
    result: Option<ResultDto>,
}

#[derive(Deserialize)]
struct WorkflowLogDto {
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ResultDto {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    raw_data: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorResponseDto {
    #[serde(default)]
    error: Option<String>,
}

impl ChatResponseDto {
    fn into_reply(self) -> BackendReply {
        if !self.success {
            return BackendReply::Failure {
                message: self
                    .error
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            };
        }

        BackendReply::Success {
            events: self
                .workflow_logs
                .into_iter()
                .map(|log| WorkflowEvent {
                    agent: log.agent,
                    text: log.message,
                })
                .collect(),
            result: self.result.map(|result| WorkflowResult {
                summary: result.summary,
                raw_data: result.raw_data,
            }),
        }
    }
}

fn map_http_error(status: StatusCode, body: String) -> TransportError {
    // Error bodies usually carry the service's own {success, error} shape;
    // fall back to the raw body, then to the status line.
    let message = serde_json::from_str::<ErrorResponseDto>(&body)
        .ok()
        .and_then(|wrapper| wrapper.error)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    TransportError::Status {
        status: status.as_u16(),
        message,
    }
}
