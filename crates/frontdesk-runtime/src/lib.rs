//! Frontdesk Runtime
//!
//! Hosts the chat session controller: the single task that owns the session
//! record, the conversation log, and the typing signal, reacting to UI
//! commands and push channel events over bounded channels.

pub mod controller;
pub mod runtime;

pub use controller::ChatController;
pub use runtime::ChatRuntime;
