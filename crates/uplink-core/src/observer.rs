//! Observer hooks connecting core mutations to a front end.
//!
//! The log and registry mutate state and call these hooks; what an
//! implementation does with them (print, forward, ignore) is its own
//! business. This split keeps the core testable with no rendering surface
//! present.

use crate::agent::{AgentId, AgentStatus};
use crate::conversation::Message;

/// Receives core state changes as they happen.
///
/// Both hooks default to no-ops so an implementation can subscribe to one
/// side only. Hooks are called after the mutation is visible and must not
/// block; heavy work belongs on the implementor's side of the boundary.
pub trait SessionObserver: Send + Sync {
    /// Called after a message was appended to the conversation log.
    fn message_appended(&self, _message: &Message) {}

    /// Called after an agent's status was written in the registry.
    fn agent_status_changed(&self, _agent: AgentId, _status: AgentStatus) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}
