//! Typed channel protocol between the UI, the controller, and the adapter
//!
//! All inter-task communication flows through these message types. The
//! controller task is the single consumer of [`Command`] and [`PushEvent`]
//! and the single producer of [`AppEvent`]; this serialization is what keeps
//! the session state single-writer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ChannelConfig;
use crate::errors::ErrorKind;
use crate::frame::RawFrame;
use crate::session::SessionPhase;
use crate::types::{Timestamp, WidgetVisibility};

// ----------------------------------------------------------------------------
// Command: UI → Controller
// ----------------------------------------------------------------------------

/// UI intents driving the session lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Open the widget; bootstraps a new session cycle
    Open { display_name: Option<String> },
    /// Send a user message (valid only while active)
    Send { content: String },
    /// Hide the widget without touching the session or channel
    Minimize,
    /// Re-show a minimized widget; no re-bootstrap
    Reopen,
    /// Empty the conversation log only
    Clear,
    /// End the chat: close the channel, drop the session, reset the log
    End,
}

// ----------------------------------------------------------------------------
// PushEvent: Adapter → Controller
// ----------------------------------------------------------------------------

/// Events emitted by the push channel adapter
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// One raw inbound frame
    Frame(RawFrame),
    /// The connection ended without a local close; terminal, never retried
    Disconnected { reason: String },
}

// ----------------------------------------------------------------------------
// AppEvent: Controller → UI
// ----------------------------------------------------------------------------

/// State changes the UI observes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// A remote message was appended to the conversation log
    MessageReceived {
        content: String,
        timestamp: Timestamp,
    },
    /// An optimistic local message was appended (before any server ack)
    MessageSent {
        id: Uuid,
        content: String,
        timestamp: Timestamp,
    },
    /// The "peer is typing" signal changed
    TypingChanged(bool),
    /// The lifecycle phase (and its visibility projection) changed
    SessionStateChanged {
        phase: SessionPhase,
        visibility: WidgetVisibility,
    },
    /// An error was surfaced as data; fatal kinds collapse the widget
    Error { kind: ErrorKind, message: String },
}

// ----------------------------------------------------------------------------
// Channel Types and Constructors
// ----------------------------------------------------------------------------

pub type CommandSender = tokio::sync::mpsc::Sender<Command>;
pub type CommandReceiver = tokio::sync::mpsc::Receiver<Command>;
pub type PushEventSender = tokio::sync::mpsc::Sender<PushEvent>;
pub type PushEventReceiver = tokio::sync::mpsc::Receiver<PushEvent>;
pub type AppEventSender = tokio::sync::mpsc::Sender<AppEvent>;
pub type AppEventReceiver = tokio::sync::mpsc::Receiver<AppEvent>;

/// Create the bounded command channel (UI → controller)
pub fn create_command_channel(config: &ChannelConfig) -> (CommandSender, CommandReceiver) {
    tokio::sync::mpsc::channel(config.command_buffer_size)
}

/// Create the bounded push event channel (adapter → controller)
pub fn create_push_event_channel(config: &ChannelConfig) -> (PushEventSender, PushEventReceiver) {
    tokio::sync::mpsc::channel(config.push_event_buffer_size)
}

/// Create the bounded app event channel (controller → UI)
pub fn create_app_event_channel(config: &ChannelConfig) -> (AppEventSender, AppEventReceiver) {
    tokio::sync::mpsc::channel(config.app_event_buffer_size)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
