//! Backend reply processing.
//!
//! Expands one backend chat reply into the ordered log appends and agent
//! status transitions that make the remote pipeline visible client-side.
//! The expansion order is the externally observable replay of how the
//! backend agents collaborated, so it is fixed: every workflow event in
//! arrival order, then the summary, then the raw payload.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::agent::{AgentId, AgentRegistry, AgentStatus};
use crate::conversation::{ConversationLog, MessageDraft};

/// Delay before a busy agent is shown online again.
pub const DEFAULT_STATUS_RESET_DELAY: Duration = Duration::from_millis(1000);

/// Summary text used when the backend finishes without one of its own.
pub const COMPLETION_FALLBACK: &str = "Task completed successfully!";

/// Display label for the structured payload attached to a result.
pub const RAW_DATA_LABEL: &str = "Raw API Data";

/// One intermediate step reported by the backend.
///
/// `agent` is the raw wire key; it may name an agent this client does not
/// know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEvent {
    pub agent: Option<String>,
    pub text: String,
}

/// Final result of a completed workflow.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowResult {
    pub summary: Option<String>,
    pub raw_data: Option<Value>,
}

/// Decoded outcome of one chat round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// The backend answered but reported a failure of its own.
    Failure { message: String },
    /// The backend executed the workflow.
    Success {
        events: Vec<WorkflowEvent>,
        result: Option<WorkflowResult>,
    },
}

/// Expands backend replies into log and registry operations.
pub struct WorkflowProcessor {
    reset_delay: Duration,
}

impl WorkflowProcessor {
    pub fn new() -> Self {
        Self {
            reset_delay: DEFAULT_STATUS_RESET_DELAY,
        }
    }

    /// Overrides the busy→online reset delay.
    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    /// Applies one reply to the log and registry.
    ///
    /// For a failure: exactly one system message, no registry mutation. For
    /// a success: each event in order becomes either an agent message (known
    /// agent: status goes `Busy`, the message is appended, and a deferred
    /// reset is scheduled) or a system message (absent or unknown agent);
    /// events are never dropped, an empty one still appends an empty system
    /// message. After all events, a present result appends the summary
    /// message and, when raw data is attached, one structured system
    /// message.
    pub async fn apply(
        &self,
        reply: BackendReply,
        log: &mut ConversationLog,
        registry: &Arc<AgentRegistry>,
    ) {
        match reply {
            BackendReply::Failure { message } => {
                tracing::warn!("[WorkflowProcessor] Backend reported failure: {}", message);
                log.append(MessageDraft::system(format!("Error: {message}")));
            }
            BackendReply::Success { events, result } => {
                tracing::debug!(
                    "[WorkflowProcessor] Applying {} workflow event(s)",
                    events.len()
                );

                for event in events {
                    match event.agent.as_deref().and_then(AgentId::from_key) {
                        Some(agent) => {
                            registry.set_status(agent, AgentStatus::Busy).await;
                            log.append(MessageDraft::agent(agent, event.text));
                            registry.schedule_reset(agent, self.reset_delay).await;
                        }
                        None => {
                            log.append(MessageDraft::system(event.text));
                        }
                    }
                }

                if let Some(result) = result {
                    let summary = result
                        .summary
                        .unwrap_or_else(|| COMPLETION_FALLBACK.to_string());
                    log.append(MessageDraft::agent(AgentId::Summary, summary));

                    if let Some(raw) = result.raw_data {
                        log.append(MessageDraft::raw_data(RAW_DATA_LABEL, raw));
                    }
                }
            }
        }
    }
}

impl Default for WorkflowProcessor {
    fn default() -> Self {
        Self::new()
    }
}
