//! Push channel wire format
//!
//! Inbound frames are `{ "topic": <string>, "content": <envelope> }` where the
//! envelope is `{ "type", "role", "text"?, "state"?, "absoluteTime"? }`.
//! Frames on unrecognized topics and envelopes with unrecognized types are
//! ignored, not errors: the backend is free to add frame kinds without
//! breaking old clients.

use serde::{Deserialize, Serialize};

use crate::errors::FrameError;

// ----------------------------------------------------------------------------
// Topics
// ----------------------------------------------------------------------------

/// Push channel topics this client understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Chat,
    Typing,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Chat => "chat",
            Topic::Typing => "typing",
        }
    }

    /// Recognize a wire topic string; `None` for topics outside the protocol
    pub fn parse(topic: &str) -> Option<Self> {
        match topic {
            "chat" => Some(Topic::Chat),
            "typing" => Some(Topic::Typing),
            _ => None,
        }
    }

    /// The full topic set subscribed after connect
    pub const ALL: [Topic; 2] = [Topic::Chat, Topic::Typing];
}

// ----------------------------------------------------------------------------
// Raw Frame
// ----------------------------------------------------------------------------

/// One inbound push channel frame, parsed only to the topic/content level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrame {
    pub topic: String,
    pub content: serde_json::Value,
}

impl RawFrame {
    /// Parse a raw text frame off the wire
    pub fn from_text(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(|e| FrameError::MalformedFrame {
            reason: e.to_string(),
        })
    }

    /// Parse this frame's content as an [`Envelope`]
    pub fn envelope(&self) -> Result<Envelope, FrameError> {
        serde_json::from_value(self.content.clone()).map_err(|e| FrameError::MalformedEnvelope {
            reason: e.to_string(),
        })
    }

    /// Build the one-shot subscription frame sent after connect
    pub fn subscription(topics: &[Topic]) -> Self {
        let names: Vec<&str> = topics.iter().map(Topic::as_str).collect();
        Self {
            topic: "subscribe".to_string(),
            content: serde_json::json!({ "topics": names }),
        }
    }

    /// Serialize for the wire
    pub fn to_text(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(|e| FrameError::MalformedFrame {
            reason: e.to_string(),
        })
    }
}

// ----------------------------------------------------------------------------
// Inner Envelope
// ----------------------------------------------------------------------------

/// Typing state carried by `typing`-type envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypingState {
    Started,
    Stopped,
}

/// The inner body shared by every recognized frame
///
/// `absolute_time` is the backend's server-side clock and is advisory only;
/// display order follows receipt order, never this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Declared envelope type: "message", "typing", or something newer
    #[serde(rename = "type")]
    pub kind: String,
    /// Participant role that produced the event
    pub role: Option<String>,
    /// Message body (present for "message" envelopes)
    pub text: Option<String>,
    /// Typing state (present for "typing" envelopes)
    pub state: Option<TypingState>,
    /// Server-side event time in epoch milliseconds (advisory)
    #[serde(rename = "absoluteTime")]
    pub absolute_time: Option<u64>,
}

impl Envelope {
    pub const KIND_MESSAGE: &'static str = "message";
    pub const KIND_TYPING: &'static str = "typing";
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_message_frame() {
        let text = r#"{"topic":"chat","content":{"type":"message","role":"AGENT","text":"hi","absoluteTime":1700000000000}}"#;
        let frame = RawFrame::from_text(text).unwrap();
        assert_eq!(Topic::parse(&frame.topic), Some(Topic::Chat));

        let envelope = frame.envelope().unwrap();
        assert_eq!(envelope.kind, Envelope::KIND_MESSAGE);
        assert_eq!(envelope.role.as_deref(), Some("AGENT"));
        assert_eq!(envelope.text.as_deref(), Some("hi"));
        assert_eq!(envelope.absolute_time, Some(1_700_000_000_000));
    }

    #[test]
    fn test_parse_typing_frame() {
        let text = r#"{"topic":"typing","content":{"type":"typing","role":"AGENT","state":"started"}}"#;
        let frame = RawFrame::from_text(text).unwrap();
        let envelope = frame.envelope().unwrap();
        assert_eq!(envelope.kind, Envelope::KIND_TYPING);
        assert_eq!(envelope.state, Some(TypingState::Started));
    }

    #[test]
    fn test_unknown_topic_is_not_recognized() {
        assert_eq!(Topic::parse("presence"), None);
        assert_eq!(Topic::parse(""), None);
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(RawFrame::from_text("not json").is_err());
        assert!(RawFrame::from_text(r#"{"topic":"chat"}"#).is_err());
    }

    #[test]
    fn test_malformed_envelope_is_an_error() {
        // Valid frame shape, but content is not an envelope object
        let frame = RawFrame::from_text(r#"{"topic":"chat","content":42}"#).unwrap();
        assert!(frame.envelope().is_err());
    }

    #[test]
    fn test_subscription_frame_round_trip() {
        let frame = RawFrame::subscription(&Topic::ALL);
        let text = frame.to_text().unwrap();
        assert!(text.contains("\"subscribe\""));
        assert!(text.contains("\"chat\""));
        assert!(text.contains("\"typing\""));
    }
}
