use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::events;
use crate::error::HealthResult;
use crate::health::CheckResult;

/// An in-process domain event
///
/// The event `name` is its type: health checks subscribe by name and the
/// dispatcher indexes them the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: Uuid,
    pub name: String,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            name: name.into(),
            payload,
            published_at: Utc::now(),
        }
    }

    /// Event without payload
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    pub fn application_started() -> Self {
        Self::named(events::APPLICATION_STARTED)
    }

    pub fn queue_updated() -> Self {
        Self::named(events::QUEUE_UPDATED)
    }

    pub fn pending_releases_updated() -> Self {
        Self::named(events::PENDING_RELEASES_UPDATED)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Notifications emitted by a health evaluation batch
pub struct HealthNotification;

impl HealthNotification {
    /// A check failed that had no prior failure on record
    pub fn failed(result: &CheckResult) -> HealthResult<DomainEvent> {
        Ok(DomainEvent::new(
            events::HEALTH_CHECK_FAILED,
            serde_json::to_value(result)?,
        ))
    }

    /// A batch finished processing
    pub fn complete() -> DomainEvent {
        DomainEvent::named(events::HEALTH_CHECK_COMPLETE)
    }

    /// Recover the result carried by a failure notification
    pub fn failed_result(event: &DomainEvent) -> Option<CheckResult> {
        if !event.is(events::HEALTH_CHECK_FAILED) {
            return None;
        }
        serde_json::from_value(event.payload.clone()).ok()
    }
}
