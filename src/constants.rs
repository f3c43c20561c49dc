//! # System Constants
//!
//! Event names, configuration keys and defaults shared across the health
//! monitoring system.

/// Domain events the health system publishes or reacts to
pub mod events {
    // Application lifecycle
    pub const APPLICATION_STARTED: &str = "application.started";

    // Health check notifications
    pub const HEALTH_CHECK_FAILED: &str = "health_check.failed";
    pub const HEALTH_CHECK_COMPLETE: &str = "health_check.complete";

    // Queue state changes
    pub const QUEUE_UPDATED: &str = "queue.updated";
    pub const PENDING_RELEASES_UPDATED: &str = "pending_releases.updated";

    // Provider and configuration changes
    pub const DOWNLOAD_CLIENT_STATUS_CHANGED: &str = "download_client.status_changed";
    pub const PROVIDER_UPDATED: &str = "provider.updated";
    pub const PROVIDER_DELETED: &str = "provider.deleted";
    pub const CONFIG_SAVED: &str = "config.saved";
}

/// Configuration keys read by health checks
pub mod config_keys {
    pub const ENABLE_COMPLETED_DOWNLOAD_HANDLING: &str = "EnableCompletedDownloadHandling";
}

/// System-wide defaults
pub mod system {
    /// Minutes between scheduled health check runs
    pub const DEFAULT_SCHEDULE_INTERVAL_MINUTES: u64 = 360;

    /// Window for coalescing queue status broadcasts
    pub const DEFAULT_QUEUE_STATUS_DEBOUNCE_SECONDS: u64 = 5;

    /// Capacity of the domain event broadcast channel
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1000;

    /// Environment variable prefix for configuration overrides
    pub const ENV_PREFIX: &str = "HEALTHWATCH";
}
