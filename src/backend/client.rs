//! HTTP client for the answering backend

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{AskRequest, AskResponse, Backend, BackendError, CreateSessionResponse};

pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and return the JSON reply untouched.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn create_session(&self) -> Result<String, BackendError> {
        let value = self.post_json("create_session", &serde_json::json!({})).await?;
        let session: CreateSessionResponse = serde_json::from_value(value)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(session.session_id)
    }

    async fn ask(&self, session_id: &str, question: &str) -> Result<AskResponse, BackendError> {
        let request = AskRequest {
            session_id: session_id.to_string(),
            question: question.to_string(),
        };
        let value = self.post_json("ask", &request).await?;
        serde_json::from_value(value).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
