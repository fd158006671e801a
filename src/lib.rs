//! JAC BOT - chat front end for a retrieval-augmented answering backend
//!
//! Answers arrive from the backend in one piece together with the document
//! sources they were drawn from. This crate proxies the backend, keeps the
//! conversation, and presents each answer as if it were streaming: lines are
//! revealed one at a time, rendered as markdown with citation links, while
//! the transcript follows new content unless the reader has scrolled away.

pub mod backend;
pub mod config;
pub mod conversation;
pub mod session;
pub mod render;
pub mod routes;
