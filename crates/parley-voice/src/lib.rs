//! Speech capture behind a narrow capability interface.
//!
//! The platform recognizer is injected, never looked up from ambient
//! globals, so environments without one degrade to a reported condition
//! and tests can substitute a fake.

pub mod capture;

pub use capture::{
    CaptureOutcome, RecognizerError, SpeechCapability, SpeechRecognizer, VoiceCapture, VoiceError,
};
