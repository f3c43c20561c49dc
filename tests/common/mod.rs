//! Shared fixtures for health check integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use healthwatch::config::HealthConfig;
use healthwatch::constants::events;
use healthwatch::health::{
    CheckResult, EventSubscription, HealthCheck, HealthCheckService, HealthResultCache,
    NoServerChecks, ServerSideNotificationService, Severity,
};
use healthwatch::{DomainEvent, EventPublisher, HealthResult};

/// Check whose severity can be flipped between runs
pub struct SwitchableCheck {
    name: &'static str,
    severity: Mutex<Severity>,
    message: Mutex<String>,
    subscriptions: Vec<EventSubscription>,
    consumes_event: bool,
    startup: bool,
    runs: AtomicUsize,
    seen_events: Mutex<Vec<String>>,
}

impl SwitchableCheck {
    pub fn new(name: &'static str, severity: Severity) -> Self {
        Self {
            name,
            severity: Mutex::new(severity),
            message: Mutex::new(format!("{name} is unhealthy")),
            subscriptions: Vec::new(),
            consumes_event: false,
            startup: true,
            runs: AtomicUsize::new(0),
            seen_events: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribed_to(mut self, subscription: EventSubscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn consuming_events(mut self) -> Self {
        self.consumes_event = true;
        self
    }

    pub fn not_on_startup(mut self) -> Self {
        self.startup = false;
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn set(&self, severity: Severity) {
        *self.severity.lock() = severity;
    }

    pub fn set_message(&self, message: &str) {
        *self.message.lock() = message.to_string();
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn seen_events(&self) -> Vec<String> {
        self.seen_events.lock().clone()
    }

    fn result(&self) -> CheckResult {
        let severity = *self.severity.lock();
        if severity.is_ok() {
            CheckResult::ok(self.name)
        } else {
            CheckResult::new(self.name, severity, self.message.lock().clone(), None)
        }
    }
}

#[async_trait]
impl HealthCheck for SwitchableCheck {
    fn source(&self) -> &str {
        self.name
    }

    fn check_on_startup(&self) -> bool {
        self.startup
    }

    fn subscriptions(&self) -> Vec<EventSubscription> {
        self.subscriptions.clone()
    }

    fn consumes_event(&self) -> bool {
        self.consumes_event
    }

    async fn check(&self) -> HealthResult<CheckResult> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.result())
    }

    async fn check_with_event(&self, event: &DomainEvent) -> HealthResult<CheckResult> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.seen_events.lock().push(event.name.clone());
        Ok(self.result())
    }
}

/// Server check source returning a fixed list
pub struct FixedServerChecks(pub Vec<CheckResult>);

#[async_trait]
impl ServerSideNotificationService for FixedServerChecks {
    async fn get_server_checks(&self) -> Vec<CheckResult> {
        self.0.clone()
    }
}

pub struct Harness {
    pub service: Arc<HealthCheckService>,
    pub publisher: EventPublisher,
    pub notifications: broadcast::Receiver<DomainEvent>,
}

impl Harness {
    pub fn new(checks: Vec<Arc<dyn HealthCheck>>) -> Self {
        Self::with(checks, Arc::new(NoServerChecks), HealthConfig::default())
    }

    pub fn with(
        checks: Vec<Arc<dyn HealthCheck>>,
        server_checks: Arc<dyn ServerSideNotificationService>,
        config: HealthConfig,
    ) -> Self {
        let publisher = EventPublisher::new(256);
        let notifications = publisher.subscribe();
        let service = HealthCheckService::new(
            checks,
            Arc::new(HealthResultCache::new()),
            server_checks,
            publisher.clone(),
            &config,
        );
        Self {
            service,
            publisher,
            notifications,
        }
    }

    /// Wait until a batch publishes `health_check.complete`
    pub async fn wait_for_completion(&mut self) {
        let completed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match self.notifications.recv().await {
                    Ok(event) if event.is(events::HEALTH_CHECK_COMPLETE) => break,
                    Ok(_) => continue,
                    Err(e) => panic!("notification channel failed: {e}"),
                }
            }
        })
        .await;
        assert!(completed.is_ok(), "no batch completed within 5s");
    }

    /// Drain every notification published so far
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.notifications.try_recv() {
            drained.push(event);
        }
        drained
    }
}

pub fn names(notifications: &[DomainEvent]) -> Vec<&str> {
    notifications.iter().map(|e| e.name.as_str()).collect()
}

pub fn failed_count(notifications: &[DomainEvent]) -> usize {
    notifications
        .iter()
        .filter(|e| e.is(events::HEALTH_CHECK_FAILED))
        .count()
}
