//! # Health Check Contract
//!
//! The trait every probe implements, the results it produces and the event
//! subscriptions it declares.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::HealthResult;
use crate::events::DomainEvent;

/// Outcome level of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Notice,
    Warning,
    Error,
}

impl Severity {
    pub fn is_ok(&self) -> bool {
        matches!(self, Severity::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "ok",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Identity of the check that produced this result
    pub source: String,
    pub severity: Severity,
    pub message: String,
    pub wiki_url: Option<String>,
}

impl CheckResult {
    pub fn ok(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            severity: Severity::Ok,
            message: String::new(),
            wiki_url: None,
        }
    }

    pub fn new(
        source: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        wiki_url: Option<&str>,
    ) -> Self {
        Self {
            source: source.into(),
            severity,
            message: message.into(),
            wiki_url: wiki_url.map(str::to_string),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity.is_ok()
    }
}

/// Predicate over `(event, was_previously_failing)`
pub type EventPredicate = Arc<dyn Fn(&DomainEvent, bool) -> bool + Send + Sync>;

/// When an event-driven check should run
#[derive(Clone)]
pub enum CheckCondition {
    Always,
    /// Only while the check has an unresolved failure
    FailedOnly,
    /// Only while the check is currently healthy
    SuccessfulOnly,
    Custom(EventPredicate),
}

impl CheckCondition {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&DomainEvent, bool) -> bool + Send + Sync + 'static,
    {
        CheckCondition::Custom(Arc::new(predicate))
    }

    pub fn should_execute(&self, event: &DomainEvent, previously_failed: bool) -> bool {
        match self {
            CheckCondition::Always => true,
            CheckCondition::FailedOnly => previously_failed,
            CheckCondition::SuccessfulOnly => !previously_failed,
            CheckCondition::Custom(predicate) => predicate(event, previously_failed),
        }
    }
}

impl fmt::Debug for CheckCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckCondition::Always => f.write_str("Always"),
            CheckCondition::FailedOnly => f.write_str("FailedOnly"),
            CheckCondition::SuccessfulOnly => f.write_str("SuccessfulOnly"),
            CheckCondition::Custom(_) => f.write_str("Custom(<predicate>)"),
        }
    }
}

/// An event a check reacts to
#[derive(Debug, Clone)]
pub struct EventSubscription {
    pub event_name: String,
    pub condition: CheckCondition,
}

impl EventSubscription {
    pub fn new(event_name: impl Into<String>, condition: CheckCondition) -> Self {
        Self {
            event_name: event_name.into(),
            condition,
        }
    }

    pub fn always(event_name: impl Into<String>) -> Self {
        Self::new(event_name, CheckCondition::Always)
    }
}

/// A single diagnostic probe
///
/// Implementations are registered once at startup and are immutable
/// afterwards. `source` must be stable: it keys the result cache.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn source(&self) -> &str;

    fn check_on_startup(&self) -> bool {
        true
    }

    fn check_on_schedule(&self) -> bool {
        true
    }

    fn subscriptions(&self) -> Vec<EventSubscription> {
        Vec::new()
    }

    /// Whether [`check_with_event`](Self::check_with_event) should receive the triggering event
    fn consumes_event(&self) -> bool {
        false
    }

    async fn check(&self) -> HealthResult<CheckResult>;

    async fn check_with_event(&self, _event: &DomainEvent) -> HealthResult<CheckResult> {
        self.check().await
    }
}
