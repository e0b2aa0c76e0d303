//! Error types for backend communication.

use parley_core::ParleyError;
use thiserror::Error;

/// Errors from the assistant backend or the transport underneath it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status. The body text is the
    /// failure reason surfaced to the user.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response body could not be decoded against the contract.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<ApiError> for ParleyError {
    fn from(err: ApiError) -> Self {
        ParleyError::Transport(err.to_string())
    }
}
