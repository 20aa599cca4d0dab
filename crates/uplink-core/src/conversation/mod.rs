//! Conversation message types.
//!
//! This module contains the types for entries in the conversation log:
//! identifiers, roles, bodies, and the draft form accepted by
//! [`ConversationLog::append`].

mod log;

pub use log::{CLEAR_GREETING, ConversationLog};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentId;

/// Unique, monotonically orderable message identifier.
///
/// Creation timestamp in epoch milliseconds plus a per-log sequence
/// tiebreaker; ordering follows `(timestamp_ms, seq)` and matches append
/// order. Rendered and serialized as `"{timestamp_ms}-{seq}"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct MessageId {
    timestamp_ms: i64,
    seq: u64,
}

impl MessageId {
    pub(crate) fn new(timestamp_ms: i64, seq: u64) -> Self {
        Self { timestamp_ms, seq }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.timestamp_ms, self.seq)
    }
}

/// Error for a message id that is not of the form `"{millis}-{seq}"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid message id: '{0}'")]
pub struct ParseMessageIdError(String);

impl FromStr for MessageId {
    type Err = ParseMessageIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (millis, seq) = s
            .split_once('-')
            .ok_or_else(|| ParseMessageIdError(s.to_string()))?;
        let timestamp_ms = millis
            .parse::<i64>()
            .map_err(|_| ParseMessageIdError(s.to_string()))?;
        let seq = seq
            .parse::<u64>()
            .map_err(|_| ParseMessageIdError(s.to_string()))?;
        Ok(Self { timestamp_ms, seq })
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for MessageId {
    type Error = ParseMessageIdError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents the role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message attributed to a backend agent.
    Agent,
    /// System-generated message.
    System,
}

/// Content of a message: plain text or a labeled structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: String },
    Data { label: String, value: serde_json::Value },
}

impl MessageBody {
    /// Returns the text content, or `None` for structured payloads.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Data { .. } => None,
        }
    }
}

/// A single entry in the conversation log, immutable once appended.
///
/// Agent messages reference their agent by [`AgentId`] only; display
/// metadata is resolved through [`AgentId::profile`] at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    /// Set iff `role` is [`MessageRole::Agent`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    pub body: MessageBody,
    /// Creation time, serialized as RFC 3339.
    pub created_at: DateTime<Utc>,
}

/// What [`ConversationLog::append`] accepts; the log assigns the id and the
/// timestamp. The constructors are the only way to build one, which keeps
/// role/agent mismatches unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub(crate) role: MessageRole,
    pub(crate) agent: Option<AgentId>,
    pub(crate) body: MessageBody,
}

impl MessageDraft {
    /// A message typed by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            agent: None,
            body: MessageBody::Text { text: text.into() },
        }
    }

    /// A system-generated text message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            agent: None,
            body: MessageBody::Text { text: text.into() },
        }
    }

    /// A message attributed to `agent`.
    pub fn agent(agent: AgentId, text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Agent,
            agent: Some(agent),
            body: MessageBody::Text { text: text.into() },
        }
    }

    /// A system message carrying a labeled structured payload.
    pub fn raw_data(label: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            role: MessageRole::System,
            agent: None,
            body: MessageBody::Data {
                label: label.into(),
                value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_display_and_parse() {
        let id = MessageId::new(1766371200123, 7);
        assert_eq!(id.to_string(), "1766371200123-7");
        assert_eq!("1766371200123-7".parse::<MessageId>().unwrap(), id);
    }

    #[test]
    fn test_message_id_rejects_garbage() {
        assert!("".parse::<MessageId>().is_err());
        assert!("123".parse::<MessageId>().is_err());
        assert!("abc-def".parse::<MessageId>().is_err());
        assert!("12-34-56".parse::<MessageId>().is_err());
    }

    #[test]
    fn test_message_id_ordering() {
        let earlier = MessageId::new(100, 5);
        let same_ms_later = MessageId::new(100, 6);
        let later = MessageId::new(101, 0);

        assert!(earlier < same_ms_later);
        assert!(same_ms_later < later);
    }

    #[test]
    fn test_draft_constructors_pair_role_and_agent() {
        let user = MessageDraft::user("hi");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.agent, None);

        let agent = MessageDraft::agent(AgentId::Spacex, "launching");
        assert_eq!(agent.role, MessageRole::Agent);
        assert_eq!(agent.agent, Some(AgentId::Spacex));

        let data = MessageDraft::raw_data("Raw API Data", serde_json::json!({"x": 1}));
        assert_eq!(data.role, MessageRole::System);
        assert_eq!(data.agent, None);
    }

    #[test]
    fn test_message_serialization_shape() {
        let message = Message {
            id: MessageId::new(42, 0),
            role: MessageRole::Agent,
            agent: Some(AgentId::GoogleAdk),
            body: MessageBody::Text {
                text: "validated".to_string(),
            },
            created_at: DateTime::from_timestamp_millis(42).unwrap(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["id"], "42-0");
        assert_eq!(value["role"], "agent");
        assert_eq!(value["agent"], "google_adk");
        assert_eq!(value["body"]["type"], "text");
        assert_eq!(value["body"]["text"], "validated");

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn test_system_message_omits_agent_field() {
        let message = Message {
            id: MessageId::new(1, 0),
            role: MessageRole::System,
            agent: None,
            body: MessageBody::Text {
                text: "ready".to_string(),
            },
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("agent").is_none());
    }
}
