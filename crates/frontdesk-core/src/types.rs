//! Core types for the frontdesk chat client
//!
//! Small newtype and enum definitions shared by every crate in the workspace.

use core::fmt;
use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Millisecond timestamp since Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a new timestamp
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get current timestamp
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    /// Get the raw milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, other: u64) -> Timestamp {
        Timestamp(self.0 + other)
    }
}

impl Sub for Timestamp {
    type Output = u64;

    fn sub(self, other: Timestamp) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Participant Role
// ----------------------------------------------------------------------------

/// Role string identifying a participant on the wire (e.g. "CUSTOMER", "AGENT")
///
/// The backend sends roles as free-form strings; comparison is
/// case-insensitive so "Agent" and "AGENT" classify identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRole(String);

impl ParticipantRole {
    pub fn new<S: Into<String>>(role: S) -> Self {
        Self(role.into())
    }

    /// The role the widget user holds in every session
    pub fn customer() -> Self {
        Self("CUSTOMER".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive role comparison
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Sender Classification
// ----------------------------------------------------------------------------

/// Which side of the conversation a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The widget user's own messages
    Local,
    /// Anything from the other side (agent, supervisor, system)
    Remote,
}

// ----------------------------------------------------------------------------
// Widget Visibility
// ----------------------------------------------------------------------------

/// Pure UI projection of the session phase
///
/// Deliberately distinct from [`crate::session::Session`]: minimize/reopen
/// change visibility without touching session identity or the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetVisibility {
    /// No widget shown (no session, or session ended)
    Closed,
    /// Session alive, channel open, view hidden
    Minimized,
    /// Full conversation view
    Open,
}

impl fmt::Display for WidgetVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetVisibility::Closed => write!(f, "closed"),
            WidgetVisibility::Minimized => write!(f, "minimized"),
            WidgetVisibility::Open => write!(f, "open"),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
