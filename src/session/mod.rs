//! Chat session orchestration
//!
//! This module contains the submission flow that owns the conversation and
//! talks to the answering backend.

mod chat;

pub use chat::{ChatError, ChatSession, Notification, NotificationKind, PendingQuestion};
