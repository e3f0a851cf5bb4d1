//! Agent notifiers: deliver a handover payload to the agent's webhook.
//!
//! `SimulatedNotifier` only logs and waits; `WebhookNotifier` performs the
//! real HTTP POST and is used when live webhooks are enabled.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::HandoverPayload;
use crate::error::{ConfigError, NotifyError};

#[async_trait]
pub trait AgentNotifier: Send + Sync {
    /// Deliver the payload to `payload.webhook_url`.
    async fn notify(&self, payload: &HandoverPayload) -> Result<(), NotifyError>;
}

/// Logs the payload that would be sent, then succeeds after a delay.
#[derive(Debug, Clone)]
pub struct SimulatedNotifier {
    delay: Duration,
}

impl SimulatedNotifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AgentNotifier for SimulatedNotifier {
    async fn notify(&self, payload: &HandoverPayload) -> Result<(), NotifyError> {
        let answers = serde_json::to_string(&payload.answers).unwrap_or_default();
        info!(
            submission_id = %payload.submission_id,
            service_id = %payload.service_id,
            service_title = %payload.service_title,
            agent = %payload.agent_name,
            webhook = %payload.webhook_url,
            answers = %answers,
            "Simulating agent webhook call"
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Posts the payload as JSON to the agent's webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    timeout: Duration,
    token: Option<SecretString>,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration, token: Option<SecretString>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            token,
        })
    }
}

#[async_trait]
impl AgentNotifier for WebhookNotifier {
    async fn notify(&self, payload: &HandoverPayload) -> Result<(), NotifyError> {
        let url = payload.webhook_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warn!(service_id = %payload.service_id, "Refusing to call unresolved webhook");
            return Err(NotifyError::UnresolvedWebhook {
                service_id: payload.service_id.clone(),
            });
        }

        let mut request = self
            .client
            .post(url)
            .header("Idempotency-Key", payload.submission_id.to_string())
            .json(payload);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                NotifyError::RequestFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        info!(
            submission_id = %payload.submission_id,
            service_id = %payload.service_id,
            status = status.as_u16(),
            "Agent webhook delivered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentDirectory;
    use crate::quiz::AnswerSet;
    use crate::services::find_service;

    fn payload() -> HandoverPayload {
        let service = find_service("generateDoc").unwrap();
        HandoverPayload::build(&AgentDirectory::placeholders(), &service, None, AnswerSet::new())
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_notifier_succeeds_after_delay() {
        let notifier = SimulatedNotifier::new(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        notifier.notify(&payload()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn webhook_notifier_refuses_placeholder() {
        let notifier = WebhookNotifier::new(Duration::from_secs(1), None).unwrap();
        let err = notifier.notify(&payload()).await.unwrap_err();
        assert!(matches!(err, NotifyError::UnresolvedWebhook { ref service_id } if service_id == "generateDoc"));
    }
}
