//! The resume upload gate.
//!
//! Conversational sends are disabled until a document has been
//! successfully ingested. `has_document` is monotonic: once open, the
//! gate never closes again within a session, a later failed re-upload
//! included.

use tracing::debug;

use crate::error::SessionError;

/// Tracks document ingestion and the one-outstanding-upload discipline.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadGate {
    has_document: bool,
    upload_in_flight: bool,
}

impl UploadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_document(&self) -> bool {
        self.has_document
    }

    pub fn upload_in_flight(&self) -> bool {
        self.upload_in_flight
    }

    /// Mark an upload as started. Rejected while one is already in flight.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.upload_in_flight {
            return Err(SessionError::UploadInFlight);
        }
        self.upload_in_flight = true;
        Ok(())
    }

    /// Settle the in-flight upload. Opens the gate only when the backend
    /// signalled success explicitly.
    pub fn complete(&mut self, accepted: bool) {
        self.upload_in_flight = false;
        if accepted && !self.has_document {
            debug!("resume gate opened");
            self.has_document = true;
        }
    }

    /// Settle the in-flight upload after a transport or server failure.
    /// `has_document` is untouched.
    pub fn fail(&mut self) {
        self.upload_in_flight = false;
    }
}

// =============================================================================
// Tests
// =============================================================================
