//! The seam between the session engine and the network.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{ChatRequest, ChatResponse, UploadResponse};

/// Asynchronous access to the assistant backend.
///
/// The session engine talks only to this trait; [`crate::ApiClient`] is
/// the production implementation and tests substitute a scripted fake.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Submit one user turn and wait for the assistant's answer.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError>;

    /// Upload a document for ingestion under the given session identity.
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        user_id: &str,
    ) -> Result<UploadResponse, ApiError>;
}
