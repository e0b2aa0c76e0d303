//! Request and response bodies for the backend wire contracts.

use parley_core::{InputMode, InterviewState, ToolCall};
use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub temperature: f64,
}

/// Body of a successful `POST /chat` response.
///
/// `interview_state` is null when the backend declines the input, so it
/// decodes as `None` rather than failing the whole response. `tool_calls`
/// may be absent entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub interview_state: Option<InterviewState>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_input_mode: Option<InputMode>,
}

/// Body of a successful `POST /upload` response.
///
/// The backend may tack chat-response fields onto this body; only the
/// success markers are interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_indexed: Option<bool>,
}

impl UploadResponse {
    /// Whether the backend explicitly signalled that the document was
    /// ingested. Absence of a failure marker is not sufficient: the body
    /// must carry `resume_indexed: true` or `status: "ok"`.
    pub fn is_success(&self) -> bool {
        self.resume_indexed == Some(true) || self.status.as_deref() == Some("ok")
    }
}
