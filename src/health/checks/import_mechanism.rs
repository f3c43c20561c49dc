//! Warns when completed download handling is not enabled.

use async_trait::async_trait;
use std::sync::Arc;

use crate::constants::{config_keys, events};
use crate::error::{HealthError, HealthResult};
use crate::health::check::{CheckResult, EventSubscription, HealthCheck, Severity};

pub const SOURCE: &str = "ImportMechanismCheck";

/// Application settings read by the check
pub trait ConfigService: Send + Sync {
    fn is_defined(&self, key: &str) -> bool;

    fn enable_completed_download_handling(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadClientKind {
    Sabnzbd,
    Nzbget,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadClientStatus {
    pub is_localhost: bool,
}

#[async_trait]
pub trait DownloadClient: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> DownloadClientKind;

    /// Fails with [`HealthError::DownloadClientUnavailable`] when the client cannot be reached
    async fn status(&self) -> HealthResult<DownloadClientStatus>;
}

pub trait DownloadClientProvider: Send + Sync {
    fn download_clients(&self) -> Vec<Arc<dyn DownloadClient>>;
}

pub struct ImportMechanismCheck {
    config: Arc<dyn ConfigService>,
    clients: Arc<dyn DownloadClientProvider>,
}

impl ImportMechanismCheck {
    pub fn new(config: Arc<dyn ConfigService>, clients: Arc<dyn DownloadClientProvider>) -> Self {
        Self { config, clients }
    }

    fn warning(message: &str, wiki: Option<&str>) -> CheckResult {
        CheckResult::new(SOURCE, Severity::Warning, message, wiki)
    }
}

#[async_trait]
impl HealthCheck for ImportMechanismCheck {
    fn source(&self) -> &str {
        SOURCE
    }

    fn subscriptions(&self) -> Vec<EventSubscription> {
        vec![
            EventSubscription::always(events::DOWNLOAD_CLIENT_STATUS_CHANGED),
            EventSubscription::always(events::PROVIDER_UPDATED),
            EventSubscription::always(events::PROVIDER_DELETED),
            EventSubscription::always(events::CONFIG_SAVED),
        ]
    }

    async fn check(&self) -> HealthResult<CheckResult> {
        let clients = self.clients.download_clients();

        let mut statuses = Vec::with_capacity(clients.len());
        for client in &clients {
            match client.status().await {
                Ok(status) => statuses.push((client.kind(), status)),
                // Assume healthy and verify on the next run
                Err(HealthError::DownloadClientUnavailable { .. }) => {
                    return Ok(CheckResult::ok(SOURCE))
                }
                Err(e) => return Err(e),
            }
        }

        let all_localhost = statuses.iter().all(|(_, status)| status.is_localhost);

        if !self
            .config
            .is_defined(config_keys::ENABLE_COMPLETED_DOWNLOAD_HANDLING)
        {
            if !all_localhost {
                return Ok(Self::warning(
                    "Enable Completed Download Handling if possible (Multi-Computer unsupported)",
                    Some("Migrating-to-Completed-Download-Handling#Unsupported-download-client-on-different-computer"),
                ));
            }

            if statuses
                .iter()
                .all(|(kind, _)| *kind == DownloadClientKind::Sabnzbd)
            {
                return Ok(Self::warning(
                    "Enable Completed Download Handling if possible (Sabnzbd)",
                    Some("Migrating-to-Completed-Download-Handling#sabnzbd-enable-completed-download-handling"),
                ));
            }

            if statuses
                .iter()
                .all(|(kind, _)| *kind == DownloadClientKind::Nzbget)
            {
                return Ok(Self::warning(
                    "Enable Completed Download Handling if possible (Nzbget)",
                    Some("Migrating-to-Completed-Download-Handling#nzbget-enable-completed-download-handling"),
                ));
            }

            return Ok(Self::warning(
                "Enable Completed Download Handling if possible",
                Some("Migrating-to-Completed-Download-Handling"),
            ));
        }

        if !self.config.enable_completed_download_handling() {
            return Ok(Self::warning("Enable Completed Download Handling", None));
        }

        Ok(CheckResult::ok(SOURCE))
    }
}
