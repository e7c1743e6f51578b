//! Frontdesk Core
//!
//! Foundational types for the frontdesk contact-center chat client: the wire
//! envelope, conversation log, message correlator, typing tracker, session
//! lifecycle state machine, and the typed channel protocol that connects the
//! UI, the controller task, and the push channel adapter.
//!
//! This crate contains no I/O. The controller task lives in
//! `frontdesk-runtime`; the WebSocket adapter lives in `frontdesk-push`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod config;
pub mod conversation;
pub mod correlator;
pub mod errors;
pub mod frame;
pub mod service;
pub mod session;
pub mod typing;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{
    create_app_event_channel, create_command_channel, create_push_event_channel, AppEvent,
    AppEventReceiver, AppEventSender, Command, CommandReceiver, CommandSender, PushEvent,
    PushEventReceiver, PushEventSender,
};
pub use config::{ChannelConfig, ClientConfig};
pub use conversation::{ConversationLog, Message};
pub use correlator::{InboundEvent, MessageCorrelator};
pub use errors::{
    BootstrapError, ChannelError, ErrorKind, FrameError, FrontdeskError, FrontdeskResult, Result,
    SendError, StateTransitionError,
};
pub use frame::{Envelope, RawFrame, Topic, TypingState};
pub use service::{
    BootstrapResponse, BootstrapService, PushConnector, PushHandle, SendReceipt, SendTransport,
};
pub use session::{LifecycleEvent, Session, SessionPhase};
pub use typing::TypingTracker;
pub use types::{ParticipantRole, Sender, Timestamp, WidgetVisibility};
