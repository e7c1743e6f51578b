//! Message correlator: raw push frames to domain events
//!
//! Maps inbound [`RawFrame`]s onto the two domain events the controller
//! understands, classifying the sender against the session's own participant
//! role. Everything else on the wire (unknown topics, unknown envelope types,
//! participant join/leave notices) is ignored here.

use tracing::{debug, warn};

use crate::frame::{Envelope, RawFrame, Topic, TypingState};
use crate::types::{ParticipantRole, Sender, Timestamp};

// ----------------------------------------------------------------------------
// Domain Events
// ----------------------------------------------------------------------------

/// A push frame translated into conversation semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A chat message envelope
    Message {
        content: String,
        sender: Sender,
        /// Backend clock, advisory only; ordering follows receipt
        absolute_time: Option<Timestamp>,
    },
    /// A typing signal from some participant
    Typing { sender: Sender, state: TypingState },
}

// ----------------------------------------------------------------------------
// Message Correlator
// ----------------------------------------------------------------------------

/// Translates raw frames into [`InboundEvent`]s
#[derive(Debug, Clone)]
pub struct MessageCorrelator {
    local_role: ParticipantRole,
}

impl MessageCorrelator {
    pub fn new(local_role: ParticipantRole) -> Self {
        Self { local_role }
    }

    /// Classify an envelope role against the session's own role
    fn classify(&self, role: Option<&str>) -> Sender {
        match role {
            Some(role) if self.local_role.matches(role) => Sender::Local,
            // Missing roles classify as remote: only frames explicitly
            // carrying our own role are ours
            _ => Sender::Remote,
        }
    }

    /// Map one raw frame to a domain event
    ///
    /// Returns `None` for frames outside conversation semantics. Parse
    /// failures on the inner envelope are logged and swallowed here; a
    /// malformed frame must never reach the state machine as an error.
    pub fn correlate(&self, frame: &RawFrame) -> Option<InboundEvent> {
        let topic = match Topic::parse(&frame.topic) {
            Some(topic) => topic,
            None => {
                debug!(topic = %frame.topic, "ignoring frame on unrecognized topic");
                return None;
            }
        };

        let envelope = match frame.envelope() {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(topic = %frame.topic, error = %e, "dropping malformed frame body");
                return None;
            }
        };

        match topic {
            Topic::Chat => self.correlate_chat(envelope),
            Topic::Typing => self.correlate_typing(envelope),
        }
    }

    fn correlate_chat(&self, envelope: Envelope) -> Option<InboundEvent> {
        if envelope.kind != Envelope::KIND_MESSAGE {
            debug!(kind = %envelope.kind, "ignoring non-message chat envelope");
            return None;
        }

        let content = match envelope.text {
            Some(text) => text,
            None => {
                warn!("dropping message envelope without text");
                return None;
            }
        };

        Some(InboundEvent::Message {
            content,
            sender: self.classify(envelope.role.as_deref()),
            absolute_time: envelope.absolute_time.map(Timestamp::new),
        })
    }

    fn correlate_typing(&self, envelope: Envelope) -> Option<InboundEvent> {
        if envelope.kind != Envelope::KIND_TYPING {
            debug!(kind = %envelope.kind, "ignoring non-typing envelope on typing topic");
            return None;
        }

        let state = match envelope.state {
            Some(state) => state,
            None => {
                warn!("dropping typing envelope without state");
                return None;
            }
        };

        Some(InboundEvent::Typing {
            sender: self.classify(envelope.role.as_deref()),
            state,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
