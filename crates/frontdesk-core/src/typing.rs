//! Typing indicator tracking
//!
//! Converts the stream of raw typing-state events into a boolean "peer is
//! typing" signal with start/stop edges. The tracker is a direct mirror of
//! the last relevant remote event, with no timeout heuristics.

use crate::frame::TypingState;
use crate::types::Sender;

/// Boolean typing signal with edge detection
///
/// The UI shows only "the other side is typing", so a local `started` must
/// suppress the indicator just like a remote `stopped`.
#[derive(Debug, Default, Clone)]
pub struct TypingTracker {
    remote_typing: bool,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the remote peer is currently typing
    pub fn is_typing(&self) -> bool {
        self.remote_typing
    }

    /// Apply one typing event; returns the new value only on an edge
    pub fn apply(&mut self, sender: Sender, state: TypingState) -> Option<bool> {
        let next = match (sender, state) {
            (Sender::Remote, TypingState::Started) => true,
            (Sender::Remote, TypingState::Stopped) => false,
            // Local typing suppresses the remote indicator
            (Sender::Local, TypingState::Started) => false,
            (Sender::Local, TypingState::Stopped) => return None,
        };
        self.set(next)
    }

    /// Clear the signal (a delivered remote message implies typing stopped)
    pub fn clear(&mut self) -> Option<bool> {
        self.set(false)
    }

    fn set(&mut self, value: bool) -> Option<bool> {
        if self.remote_typing == value {
            None
        } else {
            self.remote_typing = value;
            Some(value)
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
