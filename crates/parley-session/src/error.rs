//! Error types for the session engine.

use parley_core::ParleyError;
use parley_voice::VoiceError;

/// Errors from session operations.
///
/// The precondition variants exist so the surrounding UI can gate the
/// affordance; a well-behaved caller never triggers them.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a send is already in flight")]
    SendInFlight,
    #[error("a resume must be uploaded before chatting")]
    ResumeRequired,
    #[error("an upload is already in flight")]
    UploadInFlight,
    #[error("a voice capture is already active")]
    CaptureActive,
    #[error("chat request failed: {0}")]
    Chat(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

impl From<VoiceError> for SessionError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::AlreadyActive => SessionError::CaptureActive,
        }
    }
}

impl From<SessionError> for ParleyError {
    fn from(err: SessionError) -> Self {
        ParleyError::Session(err.to_string())
    }
}
