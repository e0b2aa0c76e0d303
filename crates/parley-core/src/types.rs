use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content shown in an assistant placeholder while its answer is in flight.
pub const THINKING_PLACEHOLDER: &str = "Spinning up MCP stack…";

// =============================================================================
// Enums
// =============================================================================

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person being interviewed.
    User,
    /// The remote assistant.
    Assistant,
    /// Out-of-band notices.
    System,
}

/// Lifecycle of a message in the log.
///
/// A message is either a pending placeholder awaiting its network
/// resolution, or resolved final content. The third state of the
/// lifecycle — absent — is not being in the log at all, which is where a
/// rolled-back pair ends up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Optimistic placeholder; content is the working marker.
    Pending,
    /// Final content, confirmed by the server or authored locally.
    Resolved,
}

/// Which input control the next turn should emphasize.
///
/// Advisory only. The resolver never restricts which control the user
/// actually invokes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Text,
    Voice,
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Unique identifier for a chat message. Client-generated, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Entity Structs
// =============================================================================

/// A single entry in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub delivery: Delivery,
}

impl Message {
    /// A resolved user message with trimmed content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            delivery: Delivery::Resolved,
        }
    }

    /// The optimistic assistant placeholder appended alongside a user turn.
    pub fn pending_assistant() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: THINKING_PLACEHOLDER.to_string(),
            created_at: Utc::now(),
            delivery: Delivery::Pending,
        }
    }

    /// Resolve a pending placeholder in place with its final content.
    ///
    /// Refreshes `created_at` so the message is stamped with the moment the
    /// answer arrived, not the moment the question was asked.
    pub fn resolve(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.delivery = Delivery::Resolved;
        self.created_at = Utc::now();
    }

    pub fn is_pending(&self) -> bool {
        self.delivery == Delivery::Pending
    }
}

/// Server-reported snapshot of interview progress.
///
/// Replaced wholesale on every successful send response, never merged.
/// Slot keys are defined by the server and not known in advance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    pub slots: BTreeMap<String, Option<String>>,
    pub goal_completed: bool,
    pub ended: bool,
}

/// Derived slot-fill statistics. Never persisted.
///
/// Invariant: `remaining = max(total - filled, 0)`; a slot counts as
/// filled only when its value is non-blank after trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStats {
    pub filled: usize,
    pub total: usize,
    pub remaining: usize,
}

/// An action the backend reports having taken. Displayed, never
/// interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");

        let rt: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(rt, Role::User);
    }

    #[test]
    fn test_input_mode_wire_names() {
        assert_eq!(serde_json::to_string(&InputMode::Text).unwrap(), "\"text\"");
        assert_eq!(
            serde_json::to_string(&InputMode::Voice).unwrap(),
            "\"voice\""
        );
        assert_eq!(InputMode::default(), InputMode::Text);
    }

    #[test]
    fn test_message_id_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }

    #[test]
    fn test_user_message_is_resolved() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
        assert!(!msg.is_pending());
    }

    #[test]
    fn test_placeholder_carries_working_marker() {
        let msg = Message::pending_assistant();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, THINKING_PLACEHOLDER);
        assert!(msg.is_pending());
    }

    #[test]
    fn test_resolve_replaces_content_and_refreshes_timestamp() {
        let mut msg = Message::pending_assistant();
        let created = msg.created_at;
        msg.resolve("the answer");
        assert_eq!(msg.content, "the answer");
        assert!(!msg.is_pending());
        assert!(msg.created_at >= created);
    }

    #[test]
    fn test_interview_state_deserializes_null_slots() {
        let json = r#"{"slots":{"name":"Ana","email":null},"goal_completed":false,"ended":false}"#;
        let state: InterviewState = serde_json::from_str(json).unwrap();
        assert_eq!(state.slots.len(), 2);
        assert_eq!(state.slots["name"], Some("Ana".to_string()));
        assert_eq!(state.slots["email"], None);
    }

    #[test]
    fn test_tool_call_keeps_extra_fields() {
        let json = r#"{"tool":"whatsapp_send","target":"+123","payload":{"k":1}}"#;
        let call: ToolCall = serde_json::from_str(json).unwrap();
        assert_eq!(call.tool, "whatsapp_send");
        assert_eq!(call.target.as_deref(), Some("+123"));
        assert!(call.extra.contains_key("payload"));
    }

    #[test]
    fn test_tool_call_target_optional() {
        let call: ToolCall = serde_json::from_str(r#"{"tool":"noop"}"#).unwrap();
        assert!(call.target.is_none());
        assert!(call.extra.is_empty());
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Timestamp(1_700_000_000);
        assert_eq!(ts.to_datetime().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_slot_stats_default_is_zero() {
        let stats = SlotStats::default();
        assert_eq!(stats.filled, 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.remaining, 0);
    }
}
