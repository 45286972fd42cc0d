//! Gesture detection configuration.
//!
//! Loaded from RON so server operators can tune timing without a rebuild:
//!
//! ```ron
//! (
//!     max_progress: 8,
//!     window_ms: 2500,
//!     cooldown_ms: 1500,
//! )
//! ```
//!
//! Every field is optional; missing fields take the defaults below. Only the
//! threshold can change after construction (see
//! [`GestureDispatcher::set_max_progress`](crate::dispatcher::GestureDispatcher::set_max_progress)).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Presses required for activation.
pub const DEFAULT_MAX_PROGRESS: u32 = 10;

/// Trailing window over which presses are counted.
pub const DEFAULT_WINDOW_MS: u64 = 3000;

/// Quiet period after a completed activation.
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;

/// Broadcast capacity for the post-dispatch flow bus.
pub const DEFAULT_FLOW_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub max_progress: u32,
    pub window_ms: u64,
    pub cooldown_ms: u64,
    pub flow_capacity: usize,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            max_progress: DEFAULT_MAX_PROGRESS,
            window_ms: DEFAULT_WINDOW_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            flow_capacity: DEFAULT_FLOW_CAPACITY,
        }
    }
}

impl GestureConfig {
    /// Parse and validate a RON config document.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: GestureConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_progress == 0 {
            return Err(ConfigError::Invalid("max_progress must be at least 1".into()));
        }
        if self.window_ms == 0 {
            return Err(ConfigError::Invalid("window_ms must be greater than 0".into()));
        }
        if self.flow_capacity == 0 {
            return Err(ConfigError::Invalid("flow_capacity must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
