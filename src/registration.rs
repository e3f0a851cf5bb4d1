//! Registration step: email check plus the (simulated) backend call that
//! precedes agent activation. No account is created; the email is only
//! carried as far as the registrar call.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::error::RegistrationError;

pub const INVALID_EMAIL_MESSAGE: &str = "Por favor, ingresa un correo electrónico válido.";

/// Minimal email check: non-empty and contains `@`.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.contains('@')
}

pub fn success_message(email: &str) -> String {
    format!("¡Registro simulado con éxito para {email}! Redirigiendo al agente...")
}

pub fn failure_message(err: &RegistrationError) -> String {
    format!("No pudimos completar el registro: {err}")
}

/// Registers a contact email with the backend.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, email: &str) -> Result<(), RegistrationError>;
}

/// Registrar that waits a fixed delay and always succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedRegistrar {
    delay: Duration,
}

impl SimulatedRegistrar {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Registrar for SimulatedRegistrar {
    async fn register(&self, email: &str) -> Result<(), RegistrationError> {
        info!(email, "Simulating registration");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Registration sub-state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationState {
    /// Email of the submission in flight or last rejected by the registrar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// A registration call is in flight; further submissions are refused.
    pub processing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("@"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
    }

    #[test]
    fn success_message_mentions_email() {
        assert!(success_message("a@b.co").contains("a@b.co"));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_registrar_waits_then_succeeds() {
        let registrar = SimulatedRegistrar::new(Duration::from_millis(1500));
        let start = tokio::time::Instant::now();
        registrar.register("user@example.com").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
