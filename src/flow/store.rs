//! Session store: in-memory map of live flow sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::session::{FlowDeps, FlowSession};

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<FlowSession>>>,
    deps: Arc<FlowDeps>,
}

impl SessionStore {
    pub fn new(deps: Arc<FlowDeps>) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            deps,
        })
    }

    /// Start a new session at the intro view.
    pub async fn create(&self) -> Arc<FlowSession> {
        let session = FlowSession::new(Arc::clone(&self.deps));
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id(), Arc::clone(&session));
        info!(session_id = %session.id(), active = sessions.len(), "Session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<FlowSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Remove a session and abort its pending work.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                session.shutdown().await;
                info!(session_id = %id, "Session removed");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many
    /// were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let expired: Vec<Arc<FlowSession>> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .values()
                .filter(|s| s.idle_for() > max_idle)
                .map(|s| s.id())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for session in &expired {
            session.shutdown().await;
            debug!(session_id = %session.id(), "Idle session expired");
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Pruned idle sessions");
        }
        expired.len()
    }
}

/// Spawn a background task that prunes idle sessions every minute.
pub fn spawn_idle_sweep(store: Arc<SessionStore>, max_idle: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            store.prune_idle(max_idle).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::SimulatedResponder;
    use crate::config::{AgentDirectory, FlowConfig};
    use crate::flow::ViewState;
    use crate::handover::SimulatedNotifier;
    use crate::registration::SimulatedRegistrar;

    fn store() -> Arc<SessionStore> {
        let flow = FlowConfig::immediate();
        SessionStore::new(Arc::new(FlowDeps {
            registrar: Arc::new(SimulatedRegistrar::new(flow.registration_delay)),
            notifier: Arc::new(SimulatedNotifier::new(flow.handover_delay)),
            responder: Arc::new(SimulatedResponder::new(flow.chat_delay)),
            agents: Arc::new(AgentDirectory::placeholders()),
            flow,
        }))
    }

    #[tokio::test]
    async fn create_get_remove() {
        let store = store();
        assert!(store.is_empty().await);

        let session = store.create().await;
        assert_eq!(store.len().await, 1);
        let found = store.get(session.id()).await.unwrap();
        assert_eq!(found.snapshot().await.view, ViewState::Intro);

        assert!(store.remove(session.id()).await);
        assert!(!store.remove(session.id()).await);
        assert!(store.get(session.id()).await.is_none());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = store();
        let a = store.create().await;
        let b = store.create().await;
        a.navigate(ViewState::Quiz).await.unwrap();
        assert_eq!(a.snapshot().await.view, ViewState::Quiz);
        assert_eq!(b.snapshot().await.view, ViewState::Intro);
    }

    #[tokio::test]
    async fn prune_keeps_active_sessions() {
        let store = store();
        store.create().await;
        assert_eq!(store.prune_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn prune_drops_idle_sessions() {
        let store = store();
        store.create().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.prune_idle(Duration::from_millis(5)).await, 1);
        assert!(store.is_empty().await);
    }
}
