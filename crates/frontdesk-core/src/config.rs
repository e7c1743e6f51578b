//! Configuration for the frontdesk client

use serde::{Deserialize, Serialize};

use crate::types::ParticipantRole;

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes for the bounded channels between tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// UI → controller command buffer
    pub command_buffer_size: usize,
    /// Adapter → controller push event buffer
    pub push_event_buffer_size: usize,
    /// Controller → UI app event buffer
    pub app_event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            push_event_buffer_size: 128,
            app_event_buffer_size: 64,
        }
    }
}

impl ChannelConfig {
    /// Validate buffer sizes
    pub fn validate(&self) -> Result<(), String> {
        if self.command_buffer_size == 0 {
            return Err("command_buffer_size must be greater than 0".to_string());
        }
        if self.push_event_buffer_size == 0 {
            return Err("push_event_buffer_size must be greater than 0".to_string());
        }
        if self.app_event_buffer_size == 0 {
            return Err("app_event_buffer_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Client Configuration
// ----------------------------------------------------------------------------

/// Top-level configuration for one chat client instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The role this client holds on the wire; frames carrying this role are
    /// classified as local echoes
    pub local_role: ParticipantRole,
    /// Display name passed to the bootstrap call
    pub display_name: Option<String>,
    /// Channel buffer sizes
    pub channels: ChannelConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            local_role: ParticipantRole::customer(),
            display_name: None,
            channels: ChannelConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validate the full configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.local_role.as_str().is_empty() {
            return Err("local_role must not be empty".to_string());
        }
        self.channels.validate()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
