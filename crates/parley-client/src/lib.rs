//! HTTP client for the interview assistant backend.
//!
//! Implements the two wire contracts the session consumes — `POST /chat`
//! and `POST /upload` — behind the [`ChatBackend`] trait so tests can
//! substitute a fake.

pub mod backend;
pub mod error;
pub mod http;
pub mod types;

pub use backend::ChatBackend;
pub use error::ApiError;
pub use http::ApiClient;
pub use types::{ChatRequest, ChatResponse, UploadResponse};
