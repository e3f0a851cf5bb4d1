//! LexIA chat overlay. Independent of the current view: it can be opened
//! from any screen and closing it discards the conversation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

pub const WELCOME_MESSAGE: &str =
    "Hola! Soy LexIA, tu asistente legal inteligente general. ¿En qué puedo ayudarte hoy?";
pub const ERROR_REPLY: &str = "Lo siento, hubo un error al conectar con el asistente.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Lexia,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn lexia(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Lexia,
            text: text.into(),
        }
    }
}

/// An open chat conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    /// The assistant is composing a reply; input is refused meanwhile.
    pub typing: bool,
}

impl ChatState {
    /// Fresh conversation. With an initial message, it is posted as the
    /// user's first message and the returned text must be sent to the
    /// responder; otherwise the welcome message is shown.
    pub fn open(initial_message: Option<&str>) -> (Self, Option<String>) {
        match initial_message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(text) => (
                Self {
                    messages: vec![ChatMessage::user(text)],
                    typing: true,
                },
                Some(text.to_string()),
            ),
            None => (
                Self {
                    messages: vec![ChatMessage::lexia(WELCOME_MESSAGE)],
                    typing: false,
                },
                None,
            ),
        }
    }

    /// Post a user message. Returns the trimmed text to answer, or `None`
    /// when the input is empty or a reply is still pending.
    pub fn submit(&mut self, input: &str) -> Option<String> {
        let text = input.trim();
        if text.is_empty() || self.typing {
            return None;
        }
        self.messages.push(ChatMessage::user(text));
        self.typing = true;
        Some(text.to_string())
    }

    /// Record the assistant's reply and end the typing state.
    pub fn receive(&mut self, reply: String) {
        self.messages.push(ChatMessage::lexia(reply));
        self.typing = false;
    }
}

/// Produces assistant replies.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn reply(&self, message: &str) -> anyhow::Result<String>;
}

/// Canned reply after a delay.
#[derive(Debug, Clone)]
pub struct SimulatedResponder {
    delay: Duration,
}

impl SimulatedResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ChatResponder for SimulatedResponder {
    async fn reply(&self, message: &str) -> anyhow::Result<String> {
        info!(chars = message.chars().count(), "Simulating LexIA reply");
        tokio::time::sleep(self.delay).await;
        Ok(format!(
            "(Respuesta Simulada - Asistente General LexIA) He recibido tu consulta sobre \"{message}\". \
             En una implementación real, procesaría tu pregunta y te daría una orientación inicial."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_without_message_shows_welcome() {
        let (chat, pending) = ChatState::open(None);
        assert!(pending.is_none());
        assert!(!chat.typing);
        assert_eq!(chat.messages, vec![ChatMessage::lexia(WELCOME_MESSAGE)]);
    }

    #[test]
    fn open_with_message_waits_for_reply() {
        let (chat, pending) = ChatState::open(Some("  ¿Qué es una tutela? "));
        assert_eq!(pending.as_deref(), Some("¿Qué es una tutela?"));
        assert!(chat.typing);
        assert_eq!(chat.messages[0].sender, Sender::User);
    }

    #[test]
    fn blank_initial_message_is_ignored() {
        let (chat, pending) = ChatState::open(Some("   "));
        assert!(pending.is_none());
        assert_eq!(chat.messages[0].text, WELCOME_MESSAGE);
    }

    #[test]
    fn submit_rejects_empty_and_while_typing() {
        let (mut chat, _) = ChatState::open(None);
        assert!(chat.submit("   ").is_none());
        assert_eq!(chat.submit(" hola ").as_deref(), Some("hola"));
        assert!(chat.submit("otra").is_none());
        assert_eq!(chat.messages.len(), 2);

        chat.receive("respuesta".into());
        assert!(!chat.typing);
        assert!(chat.submit("otra").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_reply_quotes_message() {
        let responder = SimulatedResponder::new(Duration::from_millis(1500));
        let reply = responder.reply("arriendo").await.unwrap();
        assert!(reply.contains("\"arriendo\""));
    }
}
