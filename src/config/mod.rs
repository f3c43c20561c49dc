//! # Healthwatch Configuration System
//!
//! Layered configuration for the health monitoring system: built-in defaults,
//! an optional base TOML file, an optional per-environment TOML file and
//! `HEALTHWATCH__` prefixed environment variables, applied in that order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use healthwatch::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//!
//! let interval = manager.config().health.schedule_interval();
//! let window = manager.config().queue_status.broadcast_debounce();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::system;
use crate::error::{HealthError, HealthResult};

pub use loader::ConfigManager;

/// Root configuration structure mirroring healthwatch.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthwatchConfig {
    /// Health check scheduling and event handling
    pub health: HealthConfig,

    /// Queue status broadcast settings
    pub queue_status: QueueStatusConfig,

    /// Domain event channel settings
    pub events: EventsConfig,
}

/// Health check evaluation configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Minutes between scheduled runs
    pub schedule_interval_minutes: u64,

    /// Coalescing window for event-triggered checks; 0 evaluates every event immediately
    pub event_debounce_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            schedule_interval_minutes: system::DEFAULT_SCHEDULE_INTERVAL_MINUTES,
            event_debounce_ms: 0,
        }
    }
}

impl HealthConfig {
    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_minutes * 60)
    }

    pub fn event_debounce(&self) -> Option<Duration> {
        (self.event_debounce_ms > 0).then(|| Duration::from_millis(self.event_debounce_ms))
    }
}

/// Queue status broadcast configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueStatusConfig {
    pub broadcast_debounce_seconds: u64,
}

impl Default for QueueStatusConfig {
    fn default() -> Self {
        Self {
            broadcast_debounce_seconds: system::DEFAULT_QUEUE_STATUS_DEBOUNCE_SECONDS,
        }
    }
}

impl QueueStatusConfig {
    pub fn broadcast_debounce(&self) -> Duration {
        Duration::from_secs(self.broadcast_debounce_seconds)
    }
}

/// Domain event channel configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub buffer_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_size: system::DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl HealthwatchConfig {
    /// Reject values that would stall the scheduler or the broadcast channel
    pub fn validate(&self) -> HealthResult<()> {
        if self.health.schedule_interval_minutes == 0 {
            return Err(HealthError::ConfigurationError(
                "health.schedule_interval_minutes must be greater than 0".to_string(),
            ));
        }

        if self.queue_status.broadcast_debounce_seconds == 0 {
            return Err(HealthError::ConfigurationError(
                "queue_status.broadcast_debounce_seconds must be greater than 0".to_string(),
            ));
        }

        if self.events.buffer_size == 0 {
            return Err(HealthError::ConfigurationError(
                "events.buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HealthwatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.health.schedule_interval(), Duration::from_secs(360 * 60));
        assert_eq!(config.health.event_debounce(), None);
        assert_eq!(config.queue_status.broadcast_debounce(), Duration::from_secs(5));
        assert_eq!(config.events.buffer_size, 1000);
    }

    #[test]
    fn test_event_debounce_enabled_when_positive() {
        let config = HealthConfig {
            event_debounce_ms: 250,
            ..HealthConfig::default()
        };
        assert_eq!(config.event_debounce(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = HealthwatchConfig::default();
        config.health.schedule_interval_minutes = 0;
        assert!(matches!(
            config.validate(),
            Err(HealthError::ConfigurationError(_))
        ));

        let mut config = HealthwatchConfig::default();
        config.queue_status.broadcast_debounce_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = HealthwatchConfig::default();
        config.events.buffer_size = 0;
        assert!(config.validate().is_err());
    }
}
