//! Collaborator traits: the seams to the remote backend
//!
//! The controller only ever sees these interfaces. Production
//! implementations live in `frontdesk-push` (WebSocket) and the CLI crate
//! (HTTP); tests substitute stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::channel::PushEventSender;
use crate::errors::{BootstrapError, ChannelError, SendError};
use crate::frame::Topic;
use crate::session::Session;
use crate::types::Timestamp;

// ----------------------------------------------------------------------------
// Bootstrap Service
// ----------------------------------------------------------------------------

/// Raw bootstrap response as the backend returns it
///
/// `connection_token` is optional on the wire; the other three fields are
/// required and their absence is a [`BootstrapError::MissingField`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapResponse {
    #[serde(rename = "contactId")]
    pub contact_id: Option<String>,
    #[serde(rename = "participantToken")]
    pub participant_token: Option<String>,
    #[serde(rename = "connectionToken")]
    pub connection_token: Option<String>,
    #[serde(rename = "pushChannelAddress")]
    pub push_channel_address: Option<String>,
}

impl BootstrapResponse {
    /// Validate required fields and produce the all-or-nothing [`Session`]
    pub fn into_session(self) -> Result<Session, BootstrapError> {
        let contact_id = self
            .contact_id
            .ok_or(BootstrapError::MissingField { field: "contactId" })?;
        let participant_token = self.participant_token.ok_or(BootstrapError::MissingField {
            field: "participantToken",
        })?;
        let push_channel_address =
            self.push_channel_address
                .ok_or(BootstrapError::MissingField {
                    field: "pushChannelAddress",
                })?;

        Ok(Session {
            contact_id,
            participant_token,
            // The send path tolerates a missing token until first use
            connection_token: self.connection_token.unwrap_or_default(),
            push_channel_address,
        })
    }
}

/// Exchanges a display name for session identity and a push-channel address
#[async_trait]
pub trait BootstrapService: Send + Sync {
    async fn start_session(
        &self,
        display_name: Option<&str>,
    ) -> Result<BootstrapResponse, BootstrapError>;
}

// ----------------------------------------------------------------------------
// Send Transport
// ----------------------------------------------------------------------------

/// Acknowledgment from the synchronous send call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(rename = "messageTimestamp")]
    pub message_timestamp: Option<Timestamp>,
}

/// Submits one user message over the control channel
#[async_trait]
pub trait SendTransport: Send + Sync {
    async fn send_message(
        &self,
        connection_token: &str,
        content: &str,
    ) -> Result<SendReceipt, SendError>;
}

// ----------------------------------------------------------------------------
// Push Channel
// ----------------------------------------------------------------------------

/// Open handle to a connected push channel
///
/// `close` is idempotent; after the first close no further events reach the
/// controller (the adapter discards late frames).
#[async_trait]
pub trait PushHandle: Send {
    /// Send one framed subscription request (fire-and-forget; no ack awaited)
    async fn subscribe(&mut self, topics: &[Topic]) -> Result<(), ChannelError>;

    /// Release the underlying connection
    async fn close(&mut self);
}

/// Establishes push channel connections
///
/// A single-attempt lifecycle: a failed handshake or a later disconnect is
/// terminal, never retried inside the adapter.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(
        &self,
        address: &str,
        events: PushEventSender,
    ) -> Result<Box<dyn PushHandle>, ChannelError>;
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
