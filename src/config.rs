//! Configuration types.
//!
//! Everything is read from the environment once at startup. Agent webhook
//! URLs default to unresolved placeholders; a deployment overrides them per
//! service with `CIBERABOGADOS_WEBHOOK_<SERVICE>`.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;

use crate::error::ConfigError;
use crate::services::catalog::ids;

/// Webhook value used when a service has no directory entry.
pub const MISSING_WEBHOOK_URL: &str = "MISSING_WEBHOOK_URL";
/// Display name used when a service has no directory entry.
pub const FALLBACK_AGENT_NAME: &str = "agente de IA seleccionado";

const ENV_PREFIX: &str = "CIBERABOGADOS_";

/// Where a service's agent lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentConfigEntry {
    pub webhook_url: String,
    pub name: String,
}

impl AgentConfigEntry {
    pub fn new(webhook_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            name: name.into(),
        }
    }

    /// Whether the webhook is still a placeholder (or the missing sentinel)
    /// rather than a real endpoint.
    pub fn is_placeholder(&self) -> bool {
        self.webhook_url == MISSING_WEBHOOK_URL
            || !(self.webhook_url.starts_with("http://") || self.webhook_url.starts_with("https://"))
    }
}

/// Service id → agent entry.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    entries: HashMap<String, AgentConfigEntry>,
}

impl AgentDirectory {
    pub fn new(entries: HashMap<String, AgentConfigEntry>) -> Self {
        Self { entries }
    }

    /// Built-in entries with placeholder webhooks.
    pub fn placeholders() -> Self {
        let entries = [
            (ids::GENERATE_DOC, "YOUR_N8N_WEBHOOK_URL_FOR_GENERATE_DOC", "Agente generador de documentos"),
            (ids::RESOLVE_DISPUTE, "YOUR_N8N_WEBHOOK_URL_FOR_RESOLVE_DISPUTE", "Agente de resolución de disputas (ODR)"),
            (ids::PREDICTIVE_ANALYSIS, "YOUR_N8N_WEBHOOK_URL_FOR_PREDICTIVE_ANALYSIS", "Agente de análisis predictivo"),
            (ids::MANAGE_PROCEDURE, "YOUR_N8N_WEBHOOK_URL_FOR_MANAGE_PROCEDURE", "Agente de gestión de trámites"),
            (ids::MULTI_DISCIPLINARY_TEAM, "YOUR_N8N_WEBHOOK_URL_FOR_MULTI_TEAM", "Agente de asesoría multidisciplinar"),
            (ids::QUICK_CONSULTATION, "YOUR_N8N_WEBHOOK_URL_FOR_QUICK_CONSULTATION", "Agente de consultas rápidas"),
        ]
        .into_iter()
        .map(|(id, url, name)| (id.to_string(), AgentConfigEntry::new(url, name)))
        .collect();
        Self { entries }
    }

    /// Placeholders, with webhook URLs overridden from the environment.
    pub fn from_env() -> Self {
        Self::placeholders().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a lookup function keyed by env var name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (id, entry) in self.entries.iter_mut() {
            let key = webhook_env_key(id);
            if let Some(url) = lookup(&key).filter(|u| !u.trim().is_empty()) {
                tracing::debug!(service_id = %id, env = %key, "Webhook URL overridden");
                entry.webhook_url = url.trim().to_string();
            }
        }
        self
    }

    pub fn get(&self, service_id: &str) -> Option<&AgentConfigEntry> {
        self.entries.get(service_id)
    }

    /// Entry for a service, or the missing sentinel with a generic name.
    pub fn resolve(&self, service_id: &str) -> AgentConfigEntry {
        self.get(service_id).cloned().unwrap_or_else(|| {
            tracing::warn!(service_id, "No agent configured for service, using sentinel");
            AgentConfigEntry::new(MISSING_WEBHOOK_URL, FALLBACK_AGENT_NAME)
        })
    }

    /// Display name for a service's agent.
    pub fn agent_name(&self, service_id: &str) -> String {
        self.get(service_id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| FALLBACK_AGENT_NAME.to_string())
    }

    /// Number of entries still pointing at placeholders.
    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_placeholder()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `generateDoc` → `CIBERABOGADOS_WEBHOOK_GENERATE_DOC`.
pub fn webhook_env_key(service_id: &str) -> String {
    let mut key = format!("{ENV_PREFIX}WEBHOOK_");
    for (i, ch) in service_id.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            key.push('_');
        }
        key.push(ch.to_ascii_uppercase());
    }
    key
}

/// Delays for the simulated backend calls.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Simulated registration call.
    pub registration_delay: Duration,
    /// Pause between the registration success notice and the handover view.
    pub redirect_delay: Duration,
    /// Simulated agent notification.
    pub handover_delay: Duration,
    /// Simulated chat reply.
    pub chat_delay: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            registration_delay: Duration::from_millis(1500),
            redirect_delay: Duration::from_millis(1000),
            handover_delay: Duration::from_millis(2000),
            chat_delay: Duration::from_millis(1500),
        }
    }
}

impl FlowConfig {
    /// All delays zero. Handy in tests.
    pub fn immediate() -> Self {
        Self {
            registration_delay: Duration::ZERO,
            redirect_delay: Duration::ZERO,
            handover_delay: Duration::ZERO,
            chat_delay: Duration::ZERO,
        }
    }
}

/// Outbound webhook settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Deliver to real webhooks instead of logging a simulated call.
    pub live: bool,
    pub timeout: Duration,
    /// Optional bearer token sent with every webhook call.
    pub token: Option<SecretString>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            live: false,
            timeout: Duration::from_secs(10),
            token: None,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub port: u16,
    pub flow: FlowConfig,
    pub webhook: WebhookConfig,
    pub agents: AgentDirectory,
    /// Sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
    /// Directory for daily-rolling log files; stderr only when unset.
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            flow: FlowConfig::default(),
            webhook: WebhookConfig::default(),
            agents: AgentDirectory::placeholders(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take defaults;
    /// set-but-unparseable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let millis = |name: &str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(get(name), name, default.as_millis() as u64).map(Duration::from_millis)
        };

        let flow = FlowConfig {
            registration_delay: millis("REGISTRATION_DELAY_MS", defaults.flow.registration_delay)?,
            redirect_delay: millis("REDIRECT_DELAY_MS", defaults.flow.redirect_delay)?,
            handover_delay: millis("HANDOVER_DELAY_MS", defaults.flow.handover_delay)?,
            chat_delay: millis("CHAT_DELAY_MS", defaults.flow.chat_delay)?,
        };

        let webhook = WebhookConfig {
            live: parse_or(get("LIVE_WEBHOOKS"), "LIVE_WEBHOOKS", defaults.webhook.live)?,
            timeout: Duration::from_secs(parse_or(
                get("WEBHOOK_TIMEOUT_SECS"),
                "WEBHOOK_TIMEOUT_SECS",
                defaults.webhook.timeout.as_secs(),
            )?),
            token: get("WEBHOOK_TOKEN")
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        };

        Ok(Self {
            bind: get("BIND").unwrap_or(defaults.bind),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            flow,
            webhook,
            agents: AgentDirectory::placeholders().with_overrides(&lookup),
            session_idle_timeout: Duration::from_secs(parse_or(
                get("SESSION_IDLE_SECS"),
                "SESSION_IDLE_SECS",
                defaults.session_idle_timeout.as_secs(),
            )?),
            log_dir: get("LOG_DIR").filter(|d| !d.is_empty()),
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(s) => s.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}{name}"),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn env_key_from_service_id() {
        assert_eq!(webhook_env_key("generateDoc"), "CIBERABOGADOS_WEBHOOK_GENERATE_DOC");
        assert_eq!(
            webhook_env_key("multiDisciplinaryTeam"),
            "CIBERABOGADOS_WEBHOOK_MULTI_DISCIPLINARY_TEAM"
        );
    }

    #[test]
    fn placeholders_cover_catalog() {
        let dir = AgentDirectory::placeholders();
        assert_eq!(dir.len(), 6);
        for id in ids::ALL {
            assert!(dir.get(id).is_some(), "missing entry for {id}");
        }
        assert_eq!(dir.unresolved_count(), 6);
    }

    #[test]
    fn resolve_missing_uses_sentinel() {
        let dir = AgentDirectory::placeholders();
        let entry = dir.resolve("unknownService");
        assert_eq!(entry.webhook_url, MISSING_WEBHOOK_URL);
        assert_eq!(entry.name, FALLBACK_AGENT_NAME);
        assert!(entry.is_placeholder());
        assert_eq!(dir.agent_name("unknownService"), FALLBACK_AGENT_NAME);
    }

    #[test]
    fn overrides_replace_webhooks() {
        let dir = AgentDirectory::placeholders().with_overrides(lookup_from(&[(
            "CIBERABOGADOS_WEBHOOK_GENERATE_DOC",
            " https://hooks.example.com/doc ",
        )]));
        let entry = dir.get(ids::GENERATE_DOC).unwrap();
        assert_eq!(entry.webhook_url, "https://hooks.example.com/doc");
        assert!(!entry.is_placeholder());
        assert_eq!(dir.unresolved_count(), 5);
    }

    #[test]
    fn defaults_when_env_empty() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.flow.registration_delay, Duration::from_millis(1500));
        assert_eq!(config.flow.redirect_delay, Duration::from_millis(1000));
        assert!(!config.webhook.live);
        assert!(config.webhook.token.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn parses_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CIBERABOGADOS_PORT", "9090"),
            ("CIBERABOGADOS_HANDOVER_DELAY_MS", "10"),
            ("CIBERABOGADOS_LIVE_WEBHOOKS", "true"),
            ("CIBERABOGADOS_WEBHOOK_TOKEN", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.flow.handover_delay, Duration::from_millis(10));
        assert!(config.webhook.live);
        assert!(config.webhook.token.is_some());
    }

    #[test]
    fn invalid_value_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("CIBERABOGADOS_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CIBERABOGADOS_PORT"));
    }
}
