//! Interview slot-fill statistics.

use parley_core::{InterviewState, SlotStats};

/// Derive slot statistics from an interview state.
///
/// A slot counts as filled only when its value is present and non-blank
/// after trimming. Absent state yields all-zero stats.
pub fn slot_stats(state: Option<&InterviewState>) -> SlotStats {
    let Some(state) = state else {
        return SlotStats::default();
    };
    let total = state.slots.len();
    let filled = state
        .slots
        .values()
        .filter(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
        .count();
    SlotStats {
        filled,
        total,
        remaining: total.saturating_sub(filled),
    }
}

/// Holds the last server-reported interview state and its derived stats.
///
/// The state is replaced wholesale on every publish, never merged; the
/// tracker has no other state of its own.
#[derive(Debug, Default)]
pub struct InterviewProgressTracker {
    state: Option<InterviewState>,
}

impl InterviewProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked state and return the freshly derived stats.
    pub fn publish(&mut self, state: Option<InterviewState>) -> SlotStats {
        self.state = state;
        self.stats()
    }

    pub fn stats(&self) -> SlotStats {
        slot_stats(self.state.as_ref())
    }

    pub fn state(&self) -> Option<&InterviewState> {
        self.state.as_ref()
    }
}

// =============================================================================
// Tests
// =============================================================================
