//! The transport seam between a session and the remote agent backend.

use async_trait::async_trait;

use crate::agent::AgentId;
use crate::error::TransportError;
use crate::workflow::BackendReply;

/// One outbound chat request, dispatched exactly once per send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    /// Narrows the backend's context to one agent when set.
    pub agent: Option<AgentId>,
}

/// Remote backend that executes the multi-agent workflow.
///
/// Implementations live outside the core: HTTP in production, mocks in
/// tests. The session only ever sees this seam.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Executes one chat round trip.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the backend cannot be reached or
    /// its response cannot be decoded. A backend that responds but reports
    /// an application-level failure is not an error here; that case is
    /// [`BackendReply::Failure`].
    async fn send_chat(&self, request: ChatRequest) -> Result<BackendReply, TransportError>;
}
