//! Error types for the Uplink client.

use thiserror::Error;

use crate::conversation::MessageId;

/// A shared error type for the command surface of the Uplink core.
///
/// These are programmer-facing errors returned to the caller of a session
/// operation. Backend and network failures are not represented here: they
/// are recovered at the session boundary and surfaced as system messages
/// in the conversation log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UplinkError {
    /// Reference to an agent key outside the fixed roster
    #[error("Unknown agent: '{key}'")]
    UnknownAgent { key: String },

    /// Regenerate target missing, or the first entry of the log
    #[error("Message not found: {id}")]
    NotFound { id: MessageId },

    /// Regenerate target is not preceded by a user message
    #[error("Invalid state: message {id} does not follow a user message")]
    InvalidState { id: MessageId },
}

impl UplinkError {
    /// Creates an UnknownAgent error
    pub fn unknown_agent(key: impl Into<String>) -> Self {
        Self::UnknownAgent { key: key.into() }
    }

    /// Creates a NotFound error
    pub fn not_found(id: MessageId) -> Self {
        Self::NotFound { id }
    }

    /// Creates an InvalidState error
    pub fn invalid_state(id: MessageId) -> Self {
        Self::InvalidState { id }
    }

    /// Check if this is an UnknownAgent error
    pub fn is_unknown_agent(&self) -> bool {
        matches!(self, Self::UnknownAgent { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an InvalidState error
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Failure to complete a round trip to the agent backend.
///
/// Produced by [`ChatBackend`](crate::backend::ChatBackend) implementations.
/// A backend that responds but reports an application-level failure is not a
/// transport error; that case is data
/// ([`BackendReply::Failure`](crate::workflow::BackendReply::Failure)).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The backend could not be reached (connection refused, DNS, timeout)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The backend answered with a non-success HTTP status
    #[error("Backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered 2xx but the body could not be decoded
    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

/// A type alias for `Result<T, UplinkError>`.
pub type Result<T> = std::result::Result<T, UplinkError>;
