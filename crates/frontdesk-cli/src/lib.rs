//! Frontdesk CLI
//!
//! Terminal client for the frontdesk chat widget: HTTP bootstrap/send
//! implementations, a WebSocket push channel, and a line-based REPL over the
//! chat runtime.

pub mod cli;
pub mod http;
pub mod repl;
