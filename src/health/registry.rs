//! # Health Check Registry
//!
//! Classifies registered checks by trigger: startup, schedule and the
//! events they subscribe to. Built once; read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::check::{CheckCondition, HealthCheck};

/// A check paired with the condition it declared for one event name
#[derive(Clone)]
pub struct EventDrivenCheck {
    pub check: Arc<dyn HealthCheck>,
    pub condition: CheckCondition,
}

impl std::fmt::Debug for EventDrivenCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDrivenCheck")
            .field("source", &self.check.source())
            .field("condition", &self.condition)
            .finish()
    }
}

/// Index of checks by trigger class
pub struct HealthCheckRegistry {
    all: Vec<Arc<dyn HealthCheck>>,
    startup: Vec<Arc<dyn HealthCheck>>,
    scheduled: Vec<Arc<dyn HealthCheck>>,
    event_driven: HashMap<String, Vec<EventDrivenCheck>>,
}

impl HealthCheckRegistry {
    pub fn new(checks: Vec<Arc<dyn HealthCheck>>) -> Self {
        let startup = checks
            .iter()
            .filter(|c| c.check_on_startup())
            .cloned()
            .collect::<Vec<_>>();
        let scheduled = checks
            .iter()
            .filter(|c| c.check_on_schedule())
            .cloned()
            .collect::<Vec<_>>();

        let mut event_driven: HashMap<String, Vec<EventDrivenCheck>> = HashMap::new();
        for check in &checks {
            for subscription in check.subscriptions() {
                event_driven
                    .entry(subscription.event_name)
                    .or_default()
                    .push(EventDrivenCheck {
                        check: Arc::clone(check),
                        condition: subscription.condition,
                    });
            }
        }

        info!(
            total = checks.len(),
            startup = startup.len(),
            scheduled = scheduled.len(),
            event_types = event_driven.len(),
            "Health check registry built"
        );

        Self {
            all: checks,
            startup,
            scheduled,
            event_driven,
        }
    }

    pub fn all(&self) -> &[Arc<dyn HealthCheck>] {
        &self.all
    }

    pub fn startup_set(&self) -> &[Arc<dyn HealthCheck>] {
        &self.startup
    }

    pub fn scheduled_set(&self) -> &[Arc<dyn HealthCheck>] {
        &self.scheduled
    }

    /// Checks subscribed to `event_name`, in registration order
    pub fn checks_for(&self, event_name: &str) -> &[EventDrivenCheck] {
        self.event_driven
            .get(event_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.event_driven.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

impl std::fmt::Debug for HealthCheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheckRegistry")
            .field("checks", &self.all.iter().map(|c| c.source()).collect::<Vec<_>>())
            .field("event_driven", &self.event_driven)
            .finish()
    }
}
