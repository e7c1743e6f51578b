//! Session identity and the lifecycle state machine
//!
//! [`SessionPhase`] is a linear state machine: transitions consume the current
//! phase, and every edge outside the widget lifecycle is an error. The
//! controller is the sole caller and the sole mutator of the [`Session`]
//! record.

use serde::{Deserialize, Serialize};

use crate::errors::StateTransitionError;

// ----------------------------------------------------------------------------
// Session Record
// ----------------------------------------------------------------------------

/// Transport identity for one active conversation
///
/// All four fields come from a single successful bootstrap; the controller
/// holds `Option<Session>` so partial population is never observable. Created
/// by bootstrap, destroyed by end-chat, never destroyed by minimize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub contact_id: String,
    pub participant_token: String,
    pub connection_token: String,
    pub push_channel_address: String,
}

// ----------------------------------------------------------------------------
// Lifecycle Phases and Events
// ----------------------------------------------------------------------------

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session; widget not shown
    Closed,
    /// Bootstrap call and channel connect in flight
    Bootstrapping,
    /// Session established, widget open
    Active,
    /// Session alive, channel open, view hidden
    Minimized,
    /// Session over after a fatal error; error banner shown
    Ended,
}

impl SessionPhase {
    /// Phase name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Closed => "Closed",
            SessionPhase::Bootstrapping => "Bootstrapping",
            SessionPhase::Active => "Active",
            SessionPhase::Minimized => "Minimized",
            SessionPhase::Ended => "Ended",
        }
    }

    /// Whether a session record exists in this phase
    pub fn has_session(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Minimized)
    }

    /// Whether `send(text)` is accepted
    pub fn can_send(&self) -> bool {
        matches!(self, SessionPhase::Active)
    }

    /// Whether `clear()` is accepted (any non-closed phase)
    pub fn can_clear(&self) -> bool {
        !matches!(self, SessionPhase::Closed)
    }

    /// Project this phase onto the UI's tri-state widget visibility
    pub fn visibility(&self) -> crate::types::WidgetVisibility {
        use crate::types::WidgetVisibility;
        match self {
            SessionPhase::Closed | SessionPhase::Ended => WidgetVisibility::Closed,
            SessionPhase::Minimized => WidgetVisibility::Minimized,
            SessionPhase::Bootstrapping | SessionPhase::Active => WidgetVisibility::Open,
        }
    }
}

/// Events that drive lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// UI opened the widget for a new session cycle
    Open,
    /// Bootstrap and channel subscription completed
    BootstrapSucceeded,
    /// Bootstrap or channel connect failed
    BootstrapFailed,
    /// UI hid the widget
    Minimize,
    /// UI re-showed the minimized widget
    Reopen,
    /// UI ended the chat explicitly
    End,
    /// Push channel closed without an end-chat
    ChannelLost,
}

// ----------------------------------------------------------------------------
// State Machine
// ----------------------------------------------------------------------------

impl SessionPhase {
    /// Process an event and move to the next phase (consumes self)
    pub fn transition(self, event: LifecycleEvent) -> Result<SessionPhase, StateTransitionError> {
        use LifecycleEvent::*;
        use SessionPhase::*;

        let next = match (self, event) {
            // Only a fresh cycle bootstraps; Ended counts as a fresh cycle
            (Closed, Open) | (Ended, Open) => Bootstrapping,

            (Bootstrapping, BootstrapSucceeded) => Active,
            (Bootstrapping, BootstrapFailed) => Ended,
            // Ending mid-bootstrap is allowed; the stale result is discarded
            (Bootstrapping, End) => Closed,

            (Active, Minimize) => Minimized,
            (Minimized, Reopen) => Active,

            (Active, End) | (Minimized, End) => Closed,
            // A channel lost mid-bootstrap counts as a failed bootstrap step:
            // the connection may die after connect/subscribe but before the
            // bootstrap result is processed
            (Active, ChannelLost) | (Minimized, ChannelLost) | (Bootstrapping, ChannelLost) => {
                Ended
            }

            (phase, event) => {
                return Err(StateTransitionError::InvalidTransition {
                    from_phase: phase.name(),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
