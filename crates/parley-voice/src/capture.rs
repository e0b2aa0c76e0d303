//! Single-shot voice capture.
//!
//! A capture session ends on the first recognized utterance, on error, or
//! on end-of-input from the underlying capability. It never blocks other
//! interactions; only one capture may be active at a time.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

/// Result of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The first recognized utterance.
    Transcript(String),
    /// No speech capability exists in this environment. Reported, not
    /// thrown: the caller falls back to typed entry.
    Unsupported,
    /// The capture ended without a usable transcript.
    Error(String),
}

/// Failure inside an available recognizer.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("recognition ended without a transcript")]
    NoSpeech,
    #[error("{0}")]
    Failed(String),
}

/// Misuse of the capture adapter itself.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("a voice capture is already active")]
    AlreadyActive,
}

/// A platform speech recognizer: waits for one utterance and returns it.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self) -> Result<String, RecognizerError>;
}

/// The optional speech capability, made explicit instead of probed from
/// the environment at call time.
#[derive(Clone)]
pub enum SpeechCapability {
    Available(Arc<dyn SpeechRecognizer>),
    Unavailable,
}

impl SpeechCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, SpeechCapability::Available(_))
    }
}

/// Adapter enforcing the one-capture-at-a-time discipline over an
/// injected [`SpeechCapability`].
pub struct VoiceCapture {
    capability: SpeechCapability,
    active: Mutex<bool>,
}

impl VoiceCapture {
    pub fn new(capability: SpeechCapability) -> Self {
        Self {
            capability,
            active: Mutex::new(false),
        }
    }

    /// Whether a capture session is currently running.
    pub fn is_active(&self) -> bool {
        *self.active.lock().expect("capture flag poisoned")
    }

    /// Whether a speech capability exists at all.
    pub fn is_supported(&self) -> bool {
        self.capability.is_available()
    }

    /// Run one capture session.
    ///
    /// Returns `Err(VoiceError::AlreadyActive)` if a session is already
    /// running; every other condition is an outcome, not an error.
    pub async fn capture(&self) -> Result<CaptureOutcome, VoiceError> {
        let recognizer = {
            let mut active = self.active.lock().expect("capture flag poisoned");
            if *active {
                return Err(VoiceError::AlreadyActive);
            }
            match &self.capability {
                SpeechCapability::Unavailable => {
                    debug!("voice capture requested without a speech capability");
                    return Ok(CaptureOutcome::Unsupported);
                }
                SpeechCapability::Available(recognizer) => {
                    *active = true;
                    Arc::clone(recognizer)
                }
            }
        };

        let result = recognizer.recognize().await;
        *self.active.lock().expect("capture flag poisoned") = false;

        Ok(match result {
            Ok(transcript) => CaptureOutcome::Transcript(transcript),
            Err(e) => CaptureOutcome::Error(e.to_string()),
        })
    }

    /// Merge a transcript into the composer buffer: space-joined when the
    /// buffer is non-empty, with leading whitespace trimmed.
    pub fn append(buffer: &str, transcript: &str) -> String {
        let joined = if buffer.is_empty() {
            transcript.to_string()
        } else {
            format!("{buffer} {transcript}")
        };
        joined.trim_start().to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
