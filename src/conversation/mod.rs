//! Conversation types and the append-only transcript store

pub mod source;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use source::{dedup_sources, listed_sources, ListedSource, RelevanceTier, Source};

/// Identifier of a message, monotonic within one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation. Content never changes after creation.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: Arc<str>,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<Source>,
}

impl Message {
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Ordered log of exchanged messages.
///
/// Only the submission flow appends; everything else reads through
/// [`Conversation::messages`].
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: &str) -> MessageId {
        self.push(Role::User, content, Vec::new())
    }

    pub fn push_assistant(&mut self, content: &str, sources: Vec<Source>) -> MessageId {
        self.push(Role::Assistant, content, sources)
    }

    fn push(&mut self, role: Role, content: &str, sources: Vec<Source>) -> MessageId {
        let id = MessageId(self.messages.len() as u64 + 1);
        self.messages.push(Message {
            id,
            role,
            content: Arc::from(content),
            timestamp: Utc::now(),
            sources,
        });
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
