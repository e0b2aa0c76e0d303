//! Default input-mode arbitration.

use parley_core::InputMode;

/// Holds the last mode hint from the server.
///
/// `Text` until a hint arrives. Read-only advice for the UI's default
/// affordance; it never restricts which control the user invokes.
#[derive(Debug, Default)]
pub struct InputModeResolver {
    mode: InputMode,
}

impl InputModeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> InputMode {
        self.mode
    }

    /// Record a server hint. Returns whether the mode changed.
    pub fn observe(&mut self, hint: InputMode) -> bool {
        let changed = self.mode != hint;
        self.mode = hint;
        changed
    }
}
