//! Session controller: the command surface over one open chat.
//!
//! A [`Session`] owns its conversation log and agent registry, holds the
//! single in-flight-request invariant, and funnels every mutation through
//! its operations. Front ends hold it behind `Arc` and subscribe to state
//! changes via [`SessionObserver`](crate::observer::SessionObserver).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agent::{AgentId, AgentRegistry, AgentStatus};
use crate::backend::{ChatBackend, ChatRequest};
use crate::conversation::{ConversationLog, Message, MessageDraft, MessageId, MessageRole};
use crate::error::{Result, UplinkError};
use crate::observer::SessionObserver;
use crate::workflow::WorkflowProcessor;

/// System greeting appended when a session is created.
pub const WELCOME_GREETING: &str = "Welcome to the Multi-Agent AI System! Ask me anything about SpaceX launches, weather, or let me coordinate multiple agents for complex tasks.";

/// What a call to [`Session::send`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank after trimming; nothing happened.
    Ignored,
    /// Another request is outstanding; nothing happened.
    Rejected,
    /// The round trip settled and the log was updated.
    Processed,
}

/// One open chat with the agent backend.
///
/// `Session` is responsible for:
/// - Dispatching user input as chat requests, one at a time
/// - Recovering backend and transport failures into system messages
/// - Focus, regenerate, clear, and export commands
pub struct Session {
    id: String,
    log: RwLock<ConversationLog>,
    registry: Arc<AgentRegistry>,
    backend: Arc<dyn ChatBackend>,
    processor: WorkflowProcessor,
    focused_agent: RwLock<Option<AgentId>>,
    in_flight: AtomicBool,
    auto_follow: AtomicBool,
}

impl Session {
    /// Creates a session with its own log and registry, and appends the
    /// welcome greeting.
    pub fn new(backend: Arc<dyn ChatBackend>, observer: Arc<dyn SessionObserver>) -> Self {
        let id = Uuid::new_v4().to_string();
        let registry = Arc::new(AgentRegistry::new(Arc::clone(&observer)));

        let mut log = ConversationLog::new(observer);
        log.append(MessageDraft::system(WELCOME_GREETING));

        tracing::info!("[Session] Created session {}", id);

        Self {
            id,
            log: RwLock::new(log),
            registry,
            backend,
            processor: WorkflowProcessor::new(),
            focused_agent: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            auto_follow: AtomicBool::new(true),
        }
    }

    /// Overrides the workflow processor (shorter reset delays in tests).
    pub fn with_processor(mut self, processor: WorkflowProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True between dispatching a request and its resolution.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Sends one chat message through the backend.
    ///
    /// Blank input is ignored, and a send while another request is
    /// outstanding is rejected without touching the log. Otherwise the user
    /// message is appended before dispatch, so the log reflects what was
    /// sent even if the network then fails; the reply (or the failure) is
    /// folded into the log before the call returns.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            tracing::debug!("[Session] Rejected send while a request is outstanding");
            return SendOutcome::Rejected;
        };

        let focused = *self.focused_agent.read().await;
        self.log.write().await.append(MessageDraft::user(trimmed));

        tracing::info!(
            "[Session] Dispatching chat request (focus: {})",
            focused.map(|agent| agent.key()).unwrap_or("none")
        );

        let request = ChatRequest {
            message: trimmed.to_string(),
            agent: focused,
        };

        match self.backend.send_chat(request).await {
            Ok(reply) => {
                let mut log = self.log.write().await;
                self.processor.apply(reply, &mut log, &self.registry).await;
            }
            Err(err) => {
                tracing::warn!("[Session] Transport failure: {}", err);
                self.log
                    .write()
                    .await
                    .append(MessageDraft::system(format!("Network error: {err}")));
            }
        }

        SendOutcome::Processed
    }

    /// Focuses subsequent requests on one agent.
    ///
    /// Announces the new focus with a system message. Focusing never
    /// filters or hides existing log entries.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAgent` if `key` is not in the roster; the current
    /// focus is left unchanged.
    pub async fn focus_agent(&self, key: &str) -> Result<AgentId> {
        let agent = self.registry.resolve(key)?;

        *self.focused_agent.write().await = Some(agent);

        let profile = agent.profile();
        self.log.write().await.append(MessageDraft::system(format!(
            "Now focusing on {}. Ask specific questions about {}.",
            profile.name, profile.focus_hint
        )));

        tracing::info!("[Session] Focus set to {}", agent.key());
        Ok(agent)
    }

    pub async fn focused_agent(&self) -> Option<AgentId> {
        *self.focused_agent.read().await
    }

    /// Re-sends the user message that precedes `id` in the log.
    ///
    /// This is a genuine re-send: a new user message and a new backend
    /// round trip, never an edit of history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is absent or is the first entry, and
    /// `InvalidState` if the preceding entry is not a user message.
    pub async fn regenerate(&self, id: MessageId) -> Result<SendOutcome> {
        let text = {
            let log = self.log.read().await;
            let index = log.index_of(id).ok_or_else(|| UplinkError::not_found(id))?;
            if index == 0 {
                return Err(UplinkError::not_found(id));
            }

            let previous = log
                .message_at(index - 1)
                .ok_or_else(|| UplinkError::not_found(id))?;
            if previous.role != MessageRole::User {
                return Err(UplinkError::invalid_state(id));
            }

            previous
                .body
                .as_text()
                .map(str::to_owned)
                .ok_or_else(|| UplinkError::invalid_state(id))?
        };

        tracing::info!("[Session] Regenerating from message {}", id);
        Ok(self.send(&text).await)
    }

    /// Clears the conversation log.
    ///
    /// Agent statuses, pending status resets, and the focused agent are
    /// left untouched.
    pub async fn clear(&self) {
        self.log.write().await.clear();
        tracing::info!("[Session] Conversation cleared");
    }

    /// Current roster with statuses, in display order.
    pub async fn agents(&self) -> Vec<(AgentId, AgentStatus)> {
        self.registry.all().await
    }

    /// Id of the most recent log entry.
    pub async fn last_message_id(&self) -> Option<MessageId> {
        self.log.read().await.last().map(|message| message.id)
    }

    /// Captures the log and registry as one immutable, serializable
    /// document. Exporting mutates nothing.
    pub async fn export_snapshot(&self) -> SessionSnapshot {
        let messages = self.log.read().await.snapshot();
        let mut agents = Vec::new();
        for (agent, status) in self.registry.all().await {
            let profile = agent.profile();
            agents.push(AgentSnapshot {
                key: agent,
                name: profile.name.to_string(),
                icon: profile.icon.to_string(),
                description: profile.description.to_string(),
                status,
            });
        }

        SessionSnapshot {
            session_id: self.id.clone(),
            exported_at: Utc::now(),
            messages,
            agents,
        }
    }

    /// Whether a front end should pull the view to the latest message.
    pub fn auto_follow(&self) -> bool {
        self.auto_follow.load(Ordering::SeqCst)
    }

    pub fn set_auto_follow(&self, enabled: bool) {
        self.auto_follow.store(enabled, Ordering::SeqCst);
    }
}

/// Holds the in-flight flag for the duration of one send.
///
/// Releasing on drop keeps the "returns to idle when the request settles"
/// rule true on every path, including a cancelled future.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Immutable export of a session's log and registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub exported_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub agents: Vec<AgentSnapshot>,
}

/// One registry entry joined with its display profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub key: AgentId,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub status: AgentStatus,
}
