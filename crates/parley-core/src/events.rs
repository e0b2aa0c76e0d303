use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{InputMode, Timestamp};

/// Domain events emitted by the session engine after state changes.
///
/// Consumed by whatever front end is driving the session — a terminal
/// loop, a future UI — through a broadcast subscription. Events describe
/// what happened; they carry no mutable references into session state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SessionEvent {
    // =========================================================================
    // Send lifecycle
    // =========================================================================
    /// A user turn and its assistant placeholder were appended optimistically.
    SendStarted {
        user_message_id: Uuid,
        assistant_message_id: Uuid,
        timestamp: Timestamp,
    },

    /// The placeholder was resolved with the server's answer.
    SendResolved {
        message_id: Uuid,
        timestamp: Timestamp,
    },

    /// The send failed; both optimistic messages were rolled back.
    SendFailed { reason: String, timestamp: Timestamp },

    // =========================================================================
    // Upload lifecycle
    // =========================================================================
    /// A document upload began.
    UploadStarted { timestamp: Timestamp },

    /// The upload settled with a 2xx response. `accepted` reflects whether
    /// the body carried an explicit success marker.
    UploadCompleted {
        accepted: bool,
        timestamp: Timestamp,
    },

    /// The upload failed in transport or with a non-2xx status.
    UploadFailed { reason: String, timestamp: Timestamp },

    // =========================================================================
    // Interview progress
    // =========================================================================
    /// A new interview state was published after a successful send.
    InterviewUpdated {
        filled: usize,
        total: usize,
        remaining: usize,
        ended: bool,
        timestamp: Timestamp,
    },

    /// The server hinted a different default input mode for the next turn.
    InputModeChanged {
        mode: InputMode,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Voice capture
    // =========================================================================
    /// A single-shot voice capture began.
    CaptureStarted { timestamp: Timestamp },

    /// A capture produced a transcript that was appended to the composer.
    CaptureFinished {
        transcript_len: usize,
        timestamp: Timestamp,
    },

    /// No speech capability exists in this environment.
    CaptureUnsupported { timestamp: Timestamp },

    /// The capture ended in an error; the composer is unchanged.
    CaptureFailed { reason: String, timestamp: Timestamp },

    // =========================================================================
    // Conversation lifecycle
    // =========================================================================
    /// The log, interview state, and tool calls were cleared.
    ConversationReset { timestamp: Timestamp },
}

impl SessionEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            SessionEvent::SendStarted { timestamp, .. }
            | SessionEvent::SendResolved { timestamp, .. }
            | SessionEvent::SendFailed { timestamp, .. }
            | SessionEvent::UploadStarted { timestamp, .. }
            | SessionEvent::UploadCompleted { timestamp, .. }
            | SessionEvent::UploadFailed { timestamp, .. }
            | SessionEvent::InterviewUpdated { timestamp, .. }
            | SessionEvent::InputModeChanged { timestamp, .. }
            | SessionEvent::CaptureStarted { timestamp, .. }
            | SessionEvent::CaptureFinished { timestamp, .. }
            | SessionEvent::CaptureUnsupported { timestamp, .. }
            | SessionEvent::CaptureFailed { timestamp, .. }
            | SessionEvent::ConversationReset { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a stable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::SendStarted { .. } => "send_started",
            SessionEvent::SendResolved { .. } => "send_resolved",
            SessionEvent::SendFailed { .. } => "send_failed",
            SessionEvent::UploadStarted { .. } => "upload_started",
            SessionEvent::UploadCompleted { .. } => "upload_completed",
            SessionEvent::UploadFailed { .. } => "upload_failed",
            SessionEvent::InterviewUpdated { .. } => "interview_updated",
            SessionEvent::InputModeChanged { .. } => "input_mode_changed",
            SessionEvent::CaptureStarted { .. } => "capture_started",
            SessionEvent::CaptureFinished { .. } => "capture_finished",
            SessionEvent::CaptureUnsupported { .. } => "capture_unsupported",
            SessionEvent::CaptureFailed { .. } => "capture_failed",
            SessionEvent::ConversationReset { .. } => "conversation_reset",
        }
    }
}
