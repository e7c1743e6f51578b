//! Conversation log: the ordered, append-only view model of the chat
//!
//! Insertion order equals display order equals causal order of local action or
//! remote receipt. The only mutations after append are the single
//! `pending_ack` flip (conservative ack), the per-message `send_failed`
//! annotation, and a full reset on clear/end.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Sender, Timestamp};

// ----------------------------------------------------------------------------
// Message
// ----------------------------------------------------------------------------

/// One chat line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Local identifier (never sent on the wire; the backend exposes no
    /// message-level correlation id to the client)
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: Timestamp,
    /// Sent but not yet confirmed by any remote event; `Local` messages only
    pub pending_ack: bool,
    /// The outward send call for this message failed; message stays visible
    pub send_failed: bool,
}

impl Message {
    /// Create an optimistic local message, displayed before any server ack
    pub fn local(content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            sender: Sender::Local,
            timestamp: Timestamp::now(),
            pending_ack: true,
            send_failed: false,
        }
    }

    /// Create a remote message at its receipt time
    pub fn remote(content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            sender: Sender::Remote,
            timestamp: Timestamp::now(),
            pending_ack: false,
            send_failed: false,
        }
    }
}

// ----------------------------------------------------------------------------
// Conversation Log
// ----------------------------------------------------------------------------

/// Ordered, append-only sequence of [`Message`]
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, preserving insertion order
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Flip `pending_ack` to false on all matching entries
    ///
    /// Returns the number of messages flipped. Used for the conservative ack:
    /// the arrival of any remote message confirms every still-pending local
    /// send.
    pub fn mark_delivered<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&Message) -> bool,
    {
        let mut flipped = 0;
        for message in &mut self.messages {
            if message.pending_ack && predicate(message) {
                message.pending_ack = false;
                flipped += 1;
            }
        }
        flipped
    }

    /// Annotate the single affected message after a failed send call
    pub fn mark_send_failed(&mut self, id: Uuid) -> bool {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.send_failed = true;
            true
        } else {
            false
        }
    }

    /// Empty the log (clear / end chat)
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of local messages still awaiting any server acknowledgment
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.pending_ack).count()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
