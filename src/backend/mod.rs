//! Question-answering backend integration

mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::Source;

pub use client::BackendClient;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub session_id: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub session_id: String,
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// The two calls the chat surface makes
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_session(&self) -> Result<String, BackendError>;

    async fn ask(&self, session_id: &str, question: &str) -> Result<AskResponse, BackendError>;
}
