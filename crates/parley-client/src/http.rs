//! reqwest-based implementation of the backend contracts.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::backend::ChatBackend;
use crate::error::ApiError;
use crate::types::{ChatRequest, ChatResponse, UploadResponse};

/// HTTP client for the assistant backend.
///
/// Holds a pooled `reqwest::Client` and the configured base URL. One
/// instance serves the whole session; requests themselves are serialized
/// by the session's one-outstanding-send discipline, not here.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new client against `base_url` with the given timeout.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reads a response, mapping non-2xx statuses to [`ApiError::Status`]
    /// with the body text as the failure reason.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint("/chat"))
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("chat request failed: {e}")))?;

        debug!(status = %response.status(), "chat response received");
        Self::decode(response).await
    }

    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        user_id: &str,
    ) -> Result<UploadResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("user_id", user_id.to_string());

        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("upload request failed: {e}")))?;

        debug!(status = %response.status(), "upload response received");
        Self::decode(response).await
    }
}

// =============================================================================
// Tests
// =============================================================================
