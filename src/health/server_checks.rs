use async_trait::async_trait;

use super::check::CheckResult;

/// Source of health results pushed by the upstream service
///
/// Queried only on startup, scheduled and manual runs; never on event-driven runs.
#[async_trait]
pub trait ServerSideNotificationService: Send + Sync {
    async fn get_server_checks(&self) -> Vec<CheckResult>;
}

/// Notification source for deployments without an upstream service
#[derive(Debug, Default, Clone, Copy)]
pub struct NoServerChecks;

#[async_trait]
impl ServerSideNotificationService for NoServerChecks {
    async fn get_server_checks(&self) -> Vec<CheckResult> {
        Vec::new()
    }
}
