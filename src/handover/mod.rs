//! Agent handover: builds the diagnostic payload for the chosen service's
//! agent and tracks its delivery.

pub mod notifier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AgentDirectory;
use crate::quiz::{AnswerSet, LegalArea};
use crate::services::Service;

pub use notifier::{AgentNotifier, SimulatedNotifier, WebhookNotifier};

/// What is sent to an agent's webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverPayload {
    /// Stable per handover, so receivers can drop duplicate deliveries.
    pub submission_id: Uuid,
    pub service_id: String,
    pub service_title: String,
    pub agent_name: String,
    pub webhook_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<LegalArea>,
    pub answers: AnswerSet,
    pub created_at: DateTime<Utc>,
}

impl HandoverPayload {
    /// Build the payload for `service`, resolving its agent from the
    /// directory. Unknown services get the missing-webhook sentinel.
    pub fn build(
        directory: &AgentDirectory,
        service: &Service,
        area: Option<LegalArea>,
        answers: AnswerSet,
    ) -> Self {
        let agent = directory.resolve(&service.id);
        Self {
            submission_id: Uuid::new_v4(),
            service_id: service.id.clone(),
            service_title: service.title.clone(),
            agent_name: agent.name,
            webhook_url: agent.webhook_url,
            area,
            answers,
            created_at: Utc::now(),
        }
    }
}

/// Delivery status. Only affects presentation; the view does not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandoverStatus {
    Notifying,
    Completed,
    Failed { reason: String },
}

/// Handover sub-state of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandoverState {
    pub submission_id: Uuid,
    pub agent_name: String,
    pub status: HandoverStatus,
    pub status_text: String,
}

impl HandoverState {
    pub fn notifying(payload: &HandoverPayload) -> Self {
        let mut state = Self {
            submission_id: payload.submission_id,
            agent_name: payload.agent_name.clone(),
            status: HandoverStatus::Notifying,
            status_text: String::new(),
        };
        state.status_text = state.describe();
        state
    }

    pub fn set_status(&mut self, status: HandoverStatus) {
        self.status = status;
        self.status_text = self.describe();
    }

    pub fn is_done(&self) -> bool {
        !matches!(self.status, HandoverStatus::Notifying)
    }

    fn describe(&self) -> String {
        match &self.status {
            HandoverStatus::Notifying => {
                format!("Activando el {} con tu diagnóstico...", self.agent_name)
            }
            HandoverStatus::Completed => format!(
                "¡Listo! El {} recibió tu caso y te contactará con el resultado.",
                self.agent_name
            ),
            HandoverStatus::Failed { .. } => format!(
                "No pudimos notificar al {}. Inténtalo de nuevo más tarde.",
                self.agent_name
            ),
        }
    }
}
