//! Error types for the frontdesk chat client
//!
//! One enum per failure concern, unified into the main [`FrontdeskError`]
//! type. Transport- and parsing-level failures are caught at the
//! adapter/correlator boundary and delivered to the UI as [`ErrorKind`]-tagged
//! data, never as raw errors thrown into the state machine.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Failures of the session bootstrap call; fatal to the session attempt
#[derive(Debug, Clone, thiserror::Error)]
pub enum BootstrapError {
    #[error("Bootstrap request failed: {reason}")]
    RequestFailed { reason: String },
    #[error("Bootstrap response missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("Bootstrap response malformed: {reason}")]
    MalformedResponse { reason: String },
}

/// Failures of the push channel; fatal to the active session, never retried
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelError {
    #[error("Push channel connect failed for {address}: {reason}")]
    ConnectFailed { address: String, reason: String },
    #[error("Push channel closed unexpectedly: {reason}")]
    ClosedUnexpectedly { reason: String },
    #[error("Subscription request failed: {reason}")]
    SubscribeFailed { reason: String },
    #[error("Push channel is already closed")]
    Closed,
}

/// Failures of the outward send call; recoverable, reported per message
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    #[error("Send transport failure: {reason}")]
    Transport { reason: String },
    #[error("Send rejected by backend ({status}): {reason}")]
    Rejected { status: u16, reason: String },
    #[error("No connection token available for send")]
    MissingConnectionToken,
}

/// Malformed inbound frames; dropped and logged, never fatal
#[derive(Debug, Clone, thiserror::Error)]
pub enum FrameError {
    #[error("Frame body is not a valid envelope: {reason}")]
    MalformedEnvelope { reason: String },
    #[error("Frame is not valid JSON: {reason}")]
    MalformedFrame { reason: String },
}

/// Invalid lifecycle transitions
#[derive(Debug, Clone, thiserror::Error)]
pub enum StateTransitionError {
    #[error("Invalid transition from {from_phase} on {event}")]
    InvalidTransition {
        from_phase: &'static str,
        event: String,
    },
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Core error type for the frontdesk chat client
#[derive(Debug, Clone, thiserror::Error)]
pub enum FrontdeskError {
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("State transition error: {0}")]
    StateTransition(#[from] StateTransitionError),

    /// Internal channel plumbing failure (receiver dropped, buffer closed)
    #[error("Internal channel error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl FrontdeskError {
    /// Create an internal channel error with a message
    pub fn internal<T: Into<String>>(message: T) -> Self {
        FrontdeskError::Internal {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        FrontdeskError::Configuration {
            reason: reason.into(),
        }
    }
}

impl BootstrapError {
    pub fn request_failed<T: Into<String>>(reason: T) -> Self {
        BootstrapError::RequestFailed {
            reason: reason.into(),
        }
    }
}

impl ChannelError {
    pub fn connect_failed<A: Into<String>, R: Into<String>>(address: A, reason: R) -> Self {
        ChannelError::ConnectFailed {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn closed_unexpectedly<T: Into<String>>(reason: T) -> Self {
        ChannelError::ClosedUnexpectedly {
            reason: reason.into(),
        }
    }
}

impl SendError {
    pub fn transport<T: Into<String>>(reason: T) -> Self {
        SendError::Transport {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// UI-Facing Error Classification
// ----------------------------------------------------------------------------

/// Coarse error classification surfaced to the UI via `AppEvent::Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Fatal to the session attempt; widget collapses to closed/error
    Bootstrap,
    /// Fatal to the active session; widget collapses to closed/error
    Channel,
    /// Recoverable; annotates the single affected message
    Send,
}

impl FrontdeskError {
    /// Classify this error for UI reporting
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            FrontdeskError::Bootstrap(_) => Some(ErrorKind::Bootstrap),
            FrontdeskError::Channel(_) => Some(ErrorKind::Channel),
            FrontdeskError::Send(_) => Some(ErrorKind::Send),
            // Frame errors are dropped at the boundary, never surfaced
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, FrontdeskError>;
pub type FrontdeskResult<T> = Result<T>;
