// src/conversation.rs
//! Conversation state owned by the caller.
//!
//! Nothing here is global: the HTTP layer receives the conversation with each
//! request and hands the updated one back, and [`crate::grader::Grader`] only
//! ever mutates the conversation it was given.

use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Please enter your sample response to the synthesis essay prompt \
from the AP English Language & Composition exam from 2023: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered chat history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation opened by the assistant's greeting.
    pub fn with_greeting() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Records one completed exchange.
    pub fn record_turn(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.messages.push(ChatMessage::user(prompt));
        self.messages.push(ChatMessage::assistant(reply));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_starts_conversation() {
        let conv = Conversation::with_greeting();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].role, Role::Assistant);
        assert!(conv.messages()[0].text.starts_with("Please enter your sample response"));
    }

    #[test]
    fn test_record_turn_appends_user_then_assistant() {
        let mut conv = Conversation::with_greeting();
        conv.record_turn("my essay", "score: 4");

        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(conv.messages()[2].text, "score: 4");
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let conv = Conversation::from_messages(vec![ChatMessage::user("hi")]);
        let json = serde_json::to_string(&conv).unwrap();
        assert_eq!(json, r#"[{"role":"user","text":"hi"}]"#);

        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conv);
    }
}
