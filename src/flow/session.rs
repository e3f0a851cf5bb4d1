//! Flow session: one visitor's controller plus the async work it starts,
//! with every change broadcast to that session's WebSocket clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};
use uuid::Uuid;

use super::controller::{FlowController, FlowSnapshot};
use super::state::ViewState;
use crate::chat::{ChatResponder, ERROR_REPLY};
use crate::config::{AgentDirectory, FlowConfig};
use crate::error::FlowError;
use crate::handover::AgentNotifier;
use crate::quiz::{AnswerValue, QuizStep};
use crate::registration::Registrar;
use crate::services::TierAction;

/// Snapshots are small and clients resync on lag.
const BROADCAST_CAPACITY: usize = 64;

/// Backends shared by every session.
pub struct FlowDeps {
    pub registrar: Arc<dyn Registrar>,
    pub notifier: Arc<dyn AgentNotifier>,
    pub responder: Arc<dyn ChatResponder>,
    pub agents: Arc<AgentDirectory>,
    pub flow: FlowConfig,
}

pub struct FlowSession {
    id: Uuid,
    controller: Mutex<FlowController>,
    deps: Arc<FlowDeps>,
    tx: broadcast::Sender<FlowSnapshot>,
    /// Unix millis of the last client action.
    last_active: AtomicI64,
}

impl FlowSession {
    pub fn new(deps: Arc<FlowDeps>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Arc::new(Self {
            id: Uuid::new_v4(),
            controller: Mutex::new(FlowController::new()),
            deps,
            tx,
            last_active: AtomicI64::new(Utc::now().timestamp_millis()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to snapshots. Each WS client calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowSnapshot> {
        self.tx.subscribe()
    }

    pub async fn snapshot(&self) -> FlowSnapshot {
        self.controller.lock().await.snapshot(self.id, &self.deps.agents)
    }

    fn touch(&self) {
        self.last_active
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// How long since the last client action.
    pub fn idle_for(&self) -> Duration {
        let elapsed = Utc::now().timestamp_millis() - self.last_active.load(Ordering::Relaxed);
        Duration::from_millis(elapsed.max(0) as u64)
    }

    /// Abort pending tasks. Called when the session is dropped from the store;
    /// tasks hold their own reference to the session.
    pub async fn shutdown(&self) {
        self.controller.lock().await.shutdown();
    }

    // ── Client actions ─────────────────────────────────────────────────

    pub async fn navigate(self: &Arc<Self>, target: ViewState) -> Result<FlowSnapshot, FlowError> {
        self.apply(|ctl| ctl.navigate_to(target)).await.map(|(_, s)| s)
    }

    pub async fn back(self: &Arc<Self>) -> Result<FlowSnapshot, FlowError> {
        self.apply(FlowController::back).await.map(|(_, s)| s)
    }

    pub async fn answer(
        self: &Arc<Self>,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<FlowSnapshot, FlowError> {
        self.apply(|ctl| ctl.answer(question_id, value))
            .await
            .map(|(_, s)| s)
    }

    pub async fn quiz_next(self: &Arc<Self>) -> Result<(QuizStep, FlowSnapshot), FlowError> {
        self.apply(FlowController::next).await
    }

    pub async fn quiz_previous(self: &Arc<Self>) -> Result<FlowSnapshot, FlowError> {
        self.apply(FlowController::previous).await.map(|(_, s)| s)
    }

    pub async fn redo_diagnosis(self: &Arc<Self>) -> Result<FlowSnapshot, FlowError> {
        self.apply(FlowController::redo_diagnosis)
            .await
            .map(|(_, s)| s)
    }

    pub async fn select_service(self: &Arc<Self>, service_id: &str) -> Result<FlowSnapshot, FlowError> {
        self.apply(|ctl| ctl.select_service(service_id))
            .await
            .map(|(_, s)| s)
    }

    pub async fn apply_tier(
        self: &Arc<Self>,
        tier_id: &str,
    ) -> Result<(TierAction, FlowSnapshot), FlowError> {
        self.apply(|ctl| ctl.apply_tier(tier_id)).await
    }

    /// Submit the registration email and start the registrar call.
    pub async fn register(self: &Arc<Self>, email: &str) -> Result<FlowSnapshot, FlowError> {
        let session = Arc::clone(self);
        let email = email.to_string();
        self.apply(move |ctl| {
            let epoch = ctl.begin_registration(&email)?;
            let task = tokio::spawn(session.run_registration(epoch, email));
            ctl.set_view_task(task.abort_handle());
            Ok(())
        })
        .await
        .map(|(_, s)| s)
    }

    pub async fn acknowledge(self: &Arc<Self>) -> Result<FlowSnapshot, FlowError> {
        self.apply(FlowController::acknowledge)
            .await
            .map(|(_, s)| s)
    }

    pub async fn open_chat(
        self: &Arc<Self>,
        initial_message: Option<&str>,
    ) -> Result<FlowSnapshot, FlowError> {
        let session = Arc::clone(self);
        self.apply(move |ctl| {
            let (chat_epoch, pending) = ctl.open_chat(initial_message);
            if let Some(text) = pending {
                let task = tokio::spawn(session.run_chat_reply(chat_epoch, text));
                ctl.set_chat_task(task.abort_handle());
            }
            Ok(())
        })
        .await
        .map(|(_, s)| s)
    }

    pub async fn close_chat(self: &Arc<Self>) -> Result<FlowSnapshot, FlowError> {
        self.apply(|ctl| {
            ctl.close_chat();
            Ok(())
        })
        .await
        .map(|(_, s)| s)
    }

    /// Post a chat message. Empty input, or input while a reply is pending,
    /// is ignored and the snapshot is returned unchanged.
    pub async fn send_chat(self: &Arc<Self>, text: &str) -> Result<FlowSnapshot, FlowError> {
        let session = Arc::clone(self);
        self.apply(move |ctl| {
            if let Some((chat_epoch, text)) = ctl.send_chat(text)? {
                let task = tokio::spawn(session.run_chat_reply(chat_epoch, text));
                ctl.set_chat_task(task.abort_handle());
            }
            Ok(())
        })
        .await
        .map(|(_, s)| s)
    }

    pub async fn dismiss_notice(self: &Arc<Self>) -> Result<FlowSnapshot, FlowError> {
        self.apply(|ctl| {
            ctl.dismiss_notice();
            Ok(())
        })
        .await
        .map(|(_, s)| s)
    }

    /// Run a client action under the lock, then publish. The snapshot is
    /// published even when the action fails, since failures may set a notice.
    async fn apply<T, F>(self: &Arc<Self>, action: F) -> Result<(T, FlowSnapshot), FlowError>
    where
        F: FnOnce(&mut FlowController) -> Result<T, FlowError>,
    {
        self.touch();
        let mut ctl = self.controller.lock().await;
        let result = action(&mut *ctl);
        if let Err(ref e) = result {
            debug!(session_id = %self.id, error = %e, "Action rejected");
        }
        let snapshot = self.publish(&mut ctl);
        result.map(|value| (value, snapshot))
    }

    /// Start whatever the current view needs, then broadcast a snapshot.
    fn publish(self: &Arc<Self>, ctl: &mut FlowController) -> FlowSnapshot {
        if ctl.view() == ViewState::AgentHandover && ctl.handover().is_none() {
            self.start_handover(ctl);
        }
        ctl.touch();
        let snapshot = ctl.snapshot(self.id, &self.deps.agents);
        // Ok if no client is listening
        let _ = self.tx.send(snapshot.clone());
        snapshot
    }

    fn start_handover(self: &Arc<Self>, ctl: &mut FlowController) {
        let payload = match ctl.begin_handover(&self.deps.agents) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Could not start handover");
                return;
            }
        };
        let epoch = ctl.epoch();
        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = session.deps.notifier.notify(&payload).await;
            let mut ctl = session.controller.lock().await;
            if ctl.handover_finished(epoch, outcome) {
                session.publish(&mut ctl);
            }
        });
        ctl.set_view_task(task.abort_handle());
    }

    // ── Background tasks ───────────────────────────────────────────────

    async fn run_registration(self: Arc<Self>, epoch: u64, email: String) {
        if let Err(e) = self.deps.registrar.register(&email).await {
            let mut ctl = self.controller.lock().await;
            if ctl.registration_failed(epoch, &e) {
                self.publish(&mut ctl);
            }
            return;
        }

        {
            let mut ctl = self.controller.lock().await;
            if !ctl.registration_succeeded(epoch, &email) {
                return;
            }
            self.publish(&mut ctl);
        }

        tokio::time::sleep(self.deps.flow.redirect_delay).await;

        let mut ctl = self.controller.lock().await;
        match ctl.finish_registration(epoch) {
            Ok(true) => {
                self.publish(&mut ctl);
            }
            Ok(false) => {}
            Err(e) => warn!(session_id = %self.id, error = %e, "Could not enter handover"),
        }
    }

    async fn run_chat_reply(self: Arc<Self>, chat_epoch: u64, text: String) {
        let reply = match self.deps.responder.reply(&text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Chat reply failed");
                ERROR_REPLY.to_string()
            }
        };
        let mut ctl = self.controller.lock().await;
        if ctl.receive_chat(chat_epoch, reply) {
            self.publish(&mut ctl);
        }
    }
}
