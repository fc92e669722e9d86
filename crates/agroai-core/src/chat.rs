// ── Assistant chat transcript ──
//
// The backend keeps no conversation state, so the transcript lives here
// and every send replays it as history. It opens with a local greeting,
// and a failed send leaves a local apology in place of the reply.

use chrono::{DateTime, Utc};
use serde::Serialize;

use agroai_api::{ChatHistoryItem, ChatRole};

use crate::controller::Controller;
use crate::error::CoreError;

pub const CHAT_WELCOME: &str =
    "Hello! I'm the AgroAI assistant. How can I help with your greenhouse?";

/// Appended in place of a reply when the assistant cannot be reached.
pub const CHAT_FALLBACK: &str = "Sorry, there was a problem reaching the server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    User,
    Bot,
}

impl From<ChatSender> for ChatRole {
    fn from(sender: ChatSender) -> Self {
        match sender {
            ChatSender::User => Self::User,
            ChatSender::Bot => Self::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: ChatSender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One conversation with the assistant.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatSender::Bot, CHAT_WELCOME)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Everything said so far, in the backend's history format.
    pub fn history(&self) -> Vec<ChatHistoryItem> {
        self.messages
            .iter()
            .map(|m| ChatHistoryItem {
                role: m.sender.into(),
                content: m.text.clone(),
            })
            .collect()
    }

    /// Send `text` and append the exchange.
    ///
    /// Blank input is refused without touching the transcript. On failure
    /// the user's line stays and [`CHAT_FALLBACK`] is appended before the
    /// error is returned.
    pub async fn send(
        &mut self,
        controller: &Controller,
        text: &str,
    ) -> Result<&ChatMessage, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Message is empty".into(),
            });
        }
        let history = self.history();
        self.push(ChatSender::User, text);

        match controller.chat(text, history).await {
            Ok(reply) => Ok(self.push(ChatSender::Bot, reply)),
            Err(e) => {
                self.push(ChatSender::Bot, CHAT_FALLBACK);
                Err(e)
            }
        }
    }

    fn push(&mut self, sender: ChatSender, text: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage::new(sender, text));
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_opens_with_greeting() {
        let transcript = ChatTranscript::new();
        let history = transcript.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, ChatRole::Model);
        assert_eq!(history[0].content, CHAT_WELCOME);
    }
}
