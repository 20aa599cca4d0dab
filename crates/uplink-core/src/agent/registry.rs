//! Mutable status tracking for the fixed agent roster.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use strum::IntoEnumIterator;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::{AgentId, AgentStatus};
use crate::error::{Result, UplinkError};
use crate::observer::SessionObserver;

/// Tracks one mutable [`AgentStatus`] per roster identity.
///
/// `AgentRegistry` is responsible for:
/// - Resolving wire keys to identities
/// - Answering status queries, defaulting to `Online`
/// - Notifying the observer on every status write
/// - Scheduling the deferred busy→online reset that follows a workflow step
pub struct AgentRegistry {
    statuses: RwLock<HashMap<AgentId, AgentStatus>>,
    /// Pending reset per agent; a newer schedule supersedes the stored one.
    reset_tasks: Mutex<HashMap<AgentId, JoinHandle<()>>>,
    observer: Arc<dyn SessionObserver>,
}

impl AgentRegistry {
    /// Creates a registry with every agent `Online`.
    pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
        let statuses = AgentId::iter()
            .map(|agent| (agent, AgentStatus::Online))
            .collect();

        Self {
            statuses: RwLock::new(statuses),
            reset_tasks: Mutex::new(HashMap::new()),
            observer,
        }
    }

    /// Resolves a wire key to an identity.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAgent` if `key` is not in the fixed roster.
    pub fn resolve(&self, key: &str) -> Result<AgentId> {
        AgentId::from_key(key).ok_or_else(|| UplinkError::unknown_agent(key))
    }

    /// Returns the current status of `agent`.
    pub async fn status_of(&self, agent: AgentId) -> AgentStatus {
        let statuses = self.statuses.read().await;
        statuses.get(&agent).copied().unwrap_or_default()
    }

    /// Writes `status` for `agent` and notifies the observer.
    pub async fn set_status(&self, agent: AgentId, status: AgentStatus) {
        {
            let mut statuses = self.statuses.write().await;
            statuses.insert(agent, status);
        }

        tracing::debug!("[AgentRegistry] {} -> {}", agent.key(), status);
        self.observer.agent_status_changed(agent, status);
    }

    /// Returns every `(identity, status)` pair in roster display order.
    pub async fn all(&self) -> Vec<(AgentId, AgentStatus)> {
        let statuses = self.statuses.read().await;
        AgentId::iter()
            .map(|agent| (agent, statuses.get(&agent).copied().unwrap_or_default()))
            .collect()
    }

    /// Schedules `agent` to return to `Online` after `delay`.
    ///
    /// The transition models "agent finished this step" and runs as a
    /// detached task. Each agent owns at most one pending reset: scheduling
    /// again aborts the previous task, so an earlier deadline cannot pull an
    /// agent online while a later step is still showing it busy. Resets for
    /// different agents are independent and may fire in any order.
    pub async fn schedule_reset(self: &Arc<Self>, agent: AgentId, delay: Duration) {
        let registry = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.set_status(agent, AgentStatus::Online).await;
        });

        let mut tasks = self.reset_tasks.lock().await;
        if let Some(previous) = tasks.insert(agent, handle) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct StatusRecorder {
        transitions: StdMutex<Vec<(AgentId, AgentStatus)>>,
    }

    impl StatusRecorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                transitions: StdMutex::new(Vec::new()),
            })
        }

        fn transitions(&self) -> Vec<(AgentId, AgentStatus)> {
            self.transitions.lock().unwrap().clone()
        }
    }

    impl SessionObserver for StatusRecorder {
        fn agent_status_changed(&self, agent: AgentId, status: AgentStatus) {
            self.transitions.lock().unwrap().push((agent, status));
        }
    }

    #[tokio::test]
    async fn test_every_agent_starts_online() {
        let registry = AgentRegistry::new(StatusRecorder::new());

        let all = registry.all().await;
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|(_, status)| *status == AgentStatus::Online));

        // Roster display order is declaration order
        let keys: Vec<&str> = all.iter().map(|(agent, _)| agent.key()).collect();
        assert_eq!(
            keys,
            vec!["spacex", "weather", "summary", "google_adk", "system"]
        );
    }

    #[tokio::test]
    async fn test_resolve() {
        let registry = AgentRegistry::new(StatusRecorder::new());

        assert_eq!(registry.resolve("weather").unwrap(), AgentId::Weather);

        let err = registry.resolve("mars").unwrap_err();
        assert!(err.is_unknown_agent());
        assert_eq!(err.to_string(), "Unknown agent: 'mars'");
    }

    #[tokio::test]
    async fn test_set_status_notifies_observer() {
        let recorder = StatusRecorder::new();
        let registry = AgentRegistry::new(recorder.clone());

        registry.set_status(AgentId::Spacex, AgentStatus::Busy).await;

        assert_eq!(registry.status_of(AgentId::Spacex).await, AgentStatus::Busy);
        assert_eq!(
            registry.status_of(AgentId::Weather).await,
            AgentStatus::Online
        );
        assert_eq!(
            recorder.transitions(),
            vec![(AgentId::Spacex, AgentStatus::Busy)]
        );
    }

    #[tokio::test]
    async fn test_scheduled_reset_fires() {
        let recorder = StatusRecorder::new();
        let registry = Arc::new(AgentRegistry::new(recorder.clone()));

        registry.set_status(AgentId::Spacex, AgentStatus::Busy).await;
        registry
            .schedule_reset(AgentId::Spacex, Duration::from_millis(20))
            .await;

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            registry.status_of(AgentId::Spacex).await,
            AgentStatus::Online
        );
        assert_eq!(
            recorder.transitions(),
            vec![
                (AgentId::Spacex, AgentStatus::Busy),
                (AgentId::Spacex, AgentStatus::Online),
            ]
        );
    }

    #[tokio::test]
    async fn test_rescheduling_supersedes_pending_reset() {
        let registry = Arc::new(AgentRegistry::new(StatusRecorder::new()));

        registry.set_status(AgentId::Weather, AgentStatus::Busy).await;
        registry
            .schedule_reset(AgentId::Weather, Duration::from_millis(50))
            .await;
        registry
            .schedule_reset(AgentId::Weather, Duration::from_millis(400))
            .await;

        // Past the first deadline, which was superseded
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            registry.status_of(AgentId::Weather).await,
            AgentStatus::Busy
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            registry.status_of(AgentId::Weather).await,
            AgentStatus::Online
        );
    }

    #[tokio::test]
    async fn test_resets_touch_only_their_own_agent() {
        let registry = Arc::new(AgentRegistry::new(StatusRecorder::new()));

        registry.set_status(AgentId::Spacex, AgentStatus::Busy).await;
        registry.set_status(AgentId::Weather, AgentStatus::Busy).await;
        registry
            .schedule_reset(AgentId::Spacex, Duration::from_millis(20))
            .await;

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            registry.status_of(AgentId::Spacex).await,
            AgentStatus::Online
        );
        assert_eq!(
            registry.status_of(AgentId::Weather).await,
            AgentStatus::Busy
        );
    }
}
