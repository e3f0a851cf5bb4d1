//! Error types for the diagnostic flow service.

use std::time::Duration;

use crate::flow::ViewState;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Quiz authoring and answering errors.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Question {id} is not part of the current quiz")]
    UnknownQuestion { id: String },

    #[error("Unsupported question type '{type_name}' for question {id}")]
    UnsupportedType { id: String, type_name: String },

    #[error("Question {id} of type {type_name} needs at least one option")]
    MissingOptions { id: String, type_name: String },

    #[error("Duplicate question id: {id}")]
    DuplicateId { id: String },

    #[error("Failed to parse question definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Flow controller errors. None of these are fatal: the session stays on
/// its current view and the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Action requires view {expected}, current view is {actual}")]
    WrongView {
        expected: ViewState,
        actual: ViewState,
    },

    #[error("Cannot enter {target}: {missing} has not been set")]
    MissingPayload {
        target: ViewState,
        missing: &'static str,
    },

    #[error("{target} can only be entered by completing registration")]
    NotNavigable { target: ViewState },

    #[error("Unknown service: {id}")]
    UnknownService { id: String },

    #[error("Unknown pricing tier: {id}")]
    UnknownTier { id: String },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("A request is already being processed")]
    AlreadyProcessing,

    #[error("Chat is not open")]
    ChatClosed,

    #[error("Session {id} not found")]
    SessionNotFound { id: String },

    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Outbound agent notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Webhook for service {service_id} is an unresolved placeholder")]
    UnresolvedWebhook { service_id: String },

    #[error("Webhook request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Webhook {url} answered with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Webhook {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// Registration backend errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Registration backend rejected {email}: {reason}")]
    Rejected { email: String, reason: String },

    #[error("Registration backend unavailable: {0}")]
    Unavailable(String),
}
