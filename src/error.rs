//! Error types for the health monitoring system.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HealthError {
    #[error("Download client '{client}' unavailable: {reason}")]
    DownloadClientUnavailable { client: String, reason: String },
    #[error("Health check '{source_name}' failed: {reason}")]
    ProbeFailed { source_name: String, reason: String },
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Event error: {0}")]
    EventError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Broadcast error: {0}")]
    BroadcastError(String),
}

impl HealthError {
    /// Whether this error belongs to the transient download client outage class.
    ///
    /// Probes hitting this class are reported as healthy; the outage itself is
    /// picked up by the probes that watch client status directly.
    pub fn is_download_client_unavailable(&self) -> bool {
        matches!(self, HealthError::DownloadClientUnavailable { .. })
    }

    pub fn probe_failed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        HealthError::ProbeFailed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn download_client_unavailable(
        client: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        HealthError::DownloadClientUnavailable {
            client: client.into(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for HealthError {
    fn from(error: config::ConfigError) -> Self {
        HealthError::ConfigurationError(error.to_string())
    }
}

impl From<serde_json::Error> for HealthError {
    fn from(error: serde_json::Error) -> Self {
        HealthError::EventError(format!("JSON serialization error: {error}"))
    }
}

pub type HealthResult<T> = std::result::Result<T, HealthError>;
