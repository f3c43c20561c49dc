//! # Health Check Service
//!
//! Runs batches of health checks, reconciles their results against the
//! [`HealthResultCache`] and publishes notifications.
//!
//! ## Triggers
//!
//! | Trigger                        | Checks               | Server checks |
//! |--------------------------------|----------------------|---------------|
//! | `application.started`          | startup set          | yes           |
//! | scheduled tick / `Scheduled`   | scheduled set        | yes           |
//! | `Manual` command               | all checks           | yes           |
//! | any other domain event         | subscribed + allowed | no            |
//!
//! ## Notifications
//!
//! For every non-Ok result whose source had no cached failure, a
//! `health_check.failed` event is published before the cache entry is
//! written. A `health_check.complete` event always closes the batch.
//!
//! Batches never overlap: every run holds the service's run lock.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::cache::HealthResultCache;
use super::check::{CheckResult, HealthCheck};
use super::registry::HealthCheckRegistry;
use super::server_checks::ServerSideNotificationService;
use crate::config::HealthConfig;
use crate::constants::events;
use crate::error::{HealthError, HealthResult};
use crate::events::{DomainEvent, EventPublisher, HealthNotification};
use crate::logging::{log_evaluation, log_health_check_result};
use crate::utils::Debouncer;

/// Origin of a manual health check request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandTrigger {
    /// Requested by a user: runs every check
    Manual,
    /// Requested by the task scheduler: runs the scheduled set
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckHealthCommand {
    pub trigger: CommandTrigger,
}

impl CheckHealthCommand {
    pub fn manual() -> Self {
        Self {
            trigger: CommandTrigger::Manual,
        }
    }

    pub fn scheduled() -> Self {
        Self {
            trigger: CommandTrigger::Scheduled,
        }
    }
}

/// Counts produced by one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    /// Results processed, server checks included
    pub evaluated: usize,
    pub failures: usize,
    pub new_failures: usize,
}

#[derive(Clone)]
struct BatchItem {
    check: Arc<dyn HealthCheck>,
    event: Option<DomainEvent>,
}

impl BatchItem {
    fn plain(check: &Arc<dyn HealthCheck>) -> Self {
        Self {
            check: Arc::clone(check),
            event: None,
        }
    }
}

/// Event-triggered checks waiting for the debounce window to close
struct EventBatch {
    queued: Mutex<Vec<BatchItem>>,
    debouncer: Debouncer,
}

pub struct HealthCheckService {
    registry: HealthCheckRegistry,
    cache: Arc<HealthResultCache>,
    server_checks: Arc<dyn ServerSideNotificationService>,
    publisher: EventPublisher,
    run_lock: tokio::sync::Mutex<()>,
    event_batch: Option<EventBatch>,
}

impl std::fmt::Debug for HealthCheckService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheckService")
            .field("registry", &self.registry)
            .field("cached_failures", &self.cache.len())
            .field(
                "event_debounce",
                &self.event_batch.as_ref().map(|b| b.debouncer.min_interval()),
            )
            .finish()
    }
}

impl HealthCheckService {
    pub fn new(
        checks: Vec<Arc<dyn HealthCheck>>,
        cache: Arc<HealthResultCache>,
        server_checks: Arc<dyn ServerSideNotificationService>,
        publisher: EventPublisher,
        config: &HealthConfig,
    ) -> Arc<Self> {
        let registry = HealthCheckRegistry::new(checks);
        let event_debounce = config.event_debounce();

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let event_batch = event_debounce.map(|window| {
                let weak = weak.clone();
                let debouncer = Debouncer::new("health_check_events", window, move || {
                    let weak = weak.clone();
                    async move {
                        if let Some(service) = weak.upgrade() {
                            service.flush_event_batch().await;
                        }
                        Ok(())
                    }
                });
                EventBatch {
                    queued: Mutex::new(Vec::new()),
                    debouncer,
                }
            });

            Self {
                registry,
                cache,
                server_checks,
                publisher,
                run_lock: tokio::sync::Mutex::new(()),
                event_batch,
            }
        })
    }

    /// Every currently failing result
    pub fn results(&self) -> Vec<CheckResult> {
        self.cache.all_current()
    }

    pub fn registry(&self) -> &HealthCheckRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<HealthResultCache> {
        &self.cache
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, command: CheckHealthCommand) -> EvaluationSummary {
        let (trigger, checks) = match command.trigger {
            CommandTrigger::Manual => ("manual", self.registry.all()),
            CommandTrigger::Scheduled => ("scheduled", self.registry.scheduled_set()),
        };
        let items = checks.iter().map(BatchItem::plain).collect();

        let _run = self.run_lock.lock().await;
        self.perform_health_check(trigger, items, true).await
    }

    pub async fn handle_application_started(&self) -> EvaluationSummary {
        let items = self
            .registry
            .startup_set()
            .iter()
            .map(BatchItem::plain)
            .collect();

        let _run = self.run_lock.lock().await;
        self.perform_health_check("startup", items, true).await
    }

    /// Run the checks subscribed to this event
    ///
    /// Returns `None` when nothing was evaluated synchronously: the event is
    /// a completion notification, no check subscribed or allowed it, or the
    /// selected checks were queued for a debounced run.
    #[instrument(skip(self, event), fields(event_name = %event.name))]
    pub async fn handle_event(&self, event: &DomainEvent) -> Option<EvaluationSummary> {
        if event.is(events::HEALTH_CHECK_COMPLETE) {
            return None;
        }

        let candidates = self.registry.checks_for(&event.name);
        if candidates.is_empty() {
            return None;
        }

        if let Some(batch) = &self.event_batch {
            let selected = self.select_for_event(event);
            if selected.is_empty() {
                return None;
            }
            Self::queue_event_checks(batch, selected);
            return None;
        }

        let _run = self.run_lock.lock().await;
        let selected = self.select_for_event(event);
        if selected.is_empty() {
            debug!(event_name = %event.name, "No subscribed checks accepted event");
            return None;
        }

        Some(self.perform_health_check(&event.name, selected, false).await)
    }

    /// Route an event from the bus: startup run first, then subscribed checks
    pub async fn on_event(&self, event: &DomainEvent) {
        if event.is(events::APPLICATION_STARTED) {
            self.handle_application_started().await;
        }
        self.handle_event(event).await;
    }

    /// Feed events from `receiver` into [`on_event`](Self::on_event) until the channel closes
    pub fn spawn_event_listener(
        self: &Arc<Self>,
        mut receiver: broadcast::Receiver<DomainEvent>,
    ) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let Some(service) = weak.upgrade() else {
                            break;
                        };
                        service.on_event(&event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Health check listener lagged behind event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Health check event listener stopped");
        })
    }

    /// Run the scheduled set every `schedule_interval_minutes`
    ///
    /// The first run happens one interval from now; startup covers the
    /// initial evaluation.
    pub fn spawn_scheduler(
        self: &Arc<Self>,
        config: &HealthConfig,
    ) -> HealthResult<JoinHandle<()>> {
        let period = config.schedule_interval();
        if period.is_zero() {
            return Err(HealthError::ConfigurationError(
                "health.schedule_interval_minutes must be greater than 0".to_string(),
            ));
        }

        let weak = Arc::downgrade(self);
        Ok(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(service) = weak.upgrade() else {
                    break;
                };
                service.execute(CheckHealthCommand::scheduled()).await;
            }
        }))
    }

    fn select_for_event(&self, event: &DomainEvent) -> Vec<BatchItem> {
        self.registry
            .checks_for(&event.name)
            .iter()
            .filter(|candidate| {
                let previously_failed = self.cache.contains(candidate.check.source());
                candidate.condition.should_execute(event, previously_failed)
            })
            .map(|candidate| BatchItem {
                check: Arc::clone(&candidate.check),
                event: Some(event.clone()),
            })
            .collect()
    }

    fn queue_event_checks(batch: &EventBatch, selected: Vec<BatchItem>) {
        {
            let mut queued = batch.queued.lock();
            for item in selected {
                // Latest event wins for a check already waiting
                match queued
                    .iter_mut()
                    .find(|q| q.check.source() == item.check.source())
                {
                    Some(existing) => existing.event = item.event,
                    None => queued.push(item),
                }
            }
            debug!(queued = queued.len(), "Queued event-triggered health checks");
        }
        batch.debouncer.execute();
    }

    async fn flush_event_batch(&self) {
        let Some(batch) = &self.event_batch else {
            return;
        };

        let _run = self.run_lock.lock().await;
        let items = std::mem::take(&mut *batch.queued.lock());
        if items.is_empty() {
            return;
        }
        self.perform_health_check("debounced_events", items, false).await;
    }

    /// Evaluate one batch. Caller must hold the run lock.
    async fn perform_health_check(
        &self,
        trigger: &str,
        items: Vec<BatchItem>,
        include_server_checks: bool,
    ) -> EvaluationSummary {
        let mut results = Vec::with_capacity(items.len());
        for item in &items {
            if let Some(result) = Self::run_check(item).await {
                results.push(result);
            }
        }

        if include_server_checks {
            results.extend(self.server_checks.get_server_checks().await);
        }

        let mut summary = EvaluationSummary {
            evaluated: results.len(),
            ..EvaluationSummary::default()
        };

        for result in results {
            log_health_check_result(&result.source, result.severity, &result.message);

            if result.is_ok() {
                self.cache.remove(&result.source);
                continue;
            }

            summary.failures += 1;
            if !self.cache.contains(&result.source) {
                summary.new_failures += 1;
                warn!(
                    source = %result.source,
                    severity = %result.severity,
                    message = %result.message,
                    "New health check failure"
                );
                match HealthNotification::failed(&result) {
                    Ok(notification) => self.publisher.publish(notification),
                    Err(e) => error!(
                        source = %result.source,
                        error = %e,
                        "Failed to build failure notification"
                    ),
                }
            }

            self.cache.set(result.source.clone(), result);
        }

        self.publisher.publish(HealthNotification::complete());
        log_evaluation(trigger, summary.evaluated, summary.failures);

        if summary.new_failures > 0 {
            info!(
                trigger = %trigger,
                new_failures = summary.new_failures,
                "Health evaluation found new failures"
            );
        }

        summary
    }

    /// Run one check, downgrading client outages to Ok
    ///
    /// Any other error leaves the check indeterminate: it contributes no
    /// result and its cached state is kept.
    async fn run_check(item: &BatchItem) -> Option<CheckResult> {
        let check = &item.check;
        let outcome = match &item.event {
            Some(event) if check.consumes_event() => check.check_with_event(event).await,
            _ => check.check().await,
        };

        match outcome {
            Ok(result) => Some(result),
            Err(e) if e.is_download_client_unavailable() => {
                warn!(
                    source = %check.source(),
                    error = %e,
                    "Download client unavailable, assuming healthy until next run"
                );
                Some(CheckResult::ok(check.source()))
            }
            Err(e) => {
                error!(source = %check.source(), error = %e, "Health check failed to run");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::check::{CheckCondition, EventSubscription, Severity};
    use crate::health::server_checks::NoServerChecks;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedCheck {
        name: &'static str,
        outcomes: Mutex<Vec<HealthResult<Severity>>>,
        subscriptions: Vec<EventSubscription>,
        runs: AtomicUsize,
    }

    impl ScriptedCheck {
        fn new(name: &'static str, outcomes: Vec<HealthResult<Severity>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcomes: Mutex::new(outcomes),
                subscriptions: Vec::new(),
                runs: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HealthCheck for ScriptedCheck {
        fn source(&self) -> &str {
            self.name
        }

        fn subscriptions(&self) -> Vec<EventSubscription> {
            self.subscriptions.clone()
        }

        async fn check(&self) -> HealthResult<CheckResult> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock();
            let outcome = if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            };
            let severity = outcome?;
            Ok(if severity.is_ok() {
                CheckResult::ok(self.name)
            } else {
                CheckResult::new(self.name, severity, format!("{} failing", self.name), None)
            })
        }
    }

    fn service(checks: Vec<Arc<dyn HealthCheck>>) -> Arc<HealthCheckService> {
        HealthCheckService::new(
            checks,
            Arc::new(HealthResultCache::new()),
            Arc::new(NoServerChecks),
            EventPublisher::new(64),
            &HealthConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_client_outage_is_reported_healthy() {
        let check = ScriptedCheck::new(
            "ClientCheck",
            vec![
                Ok(Severity::Error),
                Err(HealthError::download_client_unavailable("sab", "timeout")),
            ],
        );
        let service = service(vec![check.clone()]);

        service.execute(CheckHealthCommand::manual()).await;
        assert_eq!(service.results().len(), 1);

        let summary = service.execute(CheckHealthCommand::manual()).await;
        assert_eq!(summary.evaluated, 1);
        assert!(service.results().is_empty());
    }

    #[tokio::test]
    async fn test_other_probe_errors_leave_cache_untouched() {
        let check = ScriptedCheck::new(
            "FlakyCheck",
            vec![
                Ok(Severity::Warning),
                Err(HealthError::probe_failed("FlakyCheck", "io error")),
            ],
        );
        let healthy = ScriptedCheck::new("Healthy", vec![Ok(Severity::Ok)]);
        let service = service(vec![check.clone(), healthy.clone()]);

        service.execute(CheckHealthCommand::manual()).await;
        let summary = service.execute(CheckHealthCommand::manual()).await;

        assert_eq!(summary.evaluated, 1);
        assert_eq!(healthy.runs.load(Ordering::SeqCst), 2);
        assert_eq!(service.results().len(), 1);
        assert_eq!(service.results()[0].source, "FlakyCheck");
    }

    #[tokio::test]
    async fn test_scheduled_command_runs_scheduled_set_only() {
        struct Unscheduled;

        #[async_trait]
        impl HealthCheck for Unscheduled {
            fn source(&self) -> &str {
                "Unscheduled"
            }

            fn check_on_schedule(&self) -> bool {
                false
            }

            async fn check(&self) -> HealthResult<CheckResult> {
                Ok(CheckResult::new("Unscheduled", Severity::Error, "down", None))
            }
        }

        let scheduled = ScriptedCheck::new("Scheduled", vec![Ok(Severity::Ok)]);
        let service = service(vec![scheduled.clone(), Arc::new(Unscheduled)]);

        let summary = service.execute(CheckHealthCommand::scheduled()).await;
        assert_eq!(summary.evaluated, 1);
        assert!(service.results().is_empty());

        let summary = service.execute(CheckHealthCommand::manual()).await;
        assert_eq!(summary.evaluated, 2);
        assert_eq!(service.results().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_only_condition_uses_cached_state() {
        let check = Arc::new(ScriptedCheck {
            name: "Recovering",
            outcomes: Mutex::new(vec![Ok(Severity::Error), Ok(Severity::Ok)]),
            subscriptions: vec![EventSubscription::new(
                events::DOWNLOAD_CLIENT_STATUS_CHANGED,
                CheckCondition::FailedOnly,
            )],
            runs: AtomicUsize::new(0),
        });
        let service = service(vec![check.clone()]);
        let event = DomainEvent::named(events::DOWNLOAD_CLIENT_STATUS_CHANGED);

        // Not failing yet: condition rejects the event
        assert!(service.handle_event(&event).await.is_none());
        assert_eq!(check.runs.load(Ordering::SeqCst), 0);

        service.execute(CheckHealthCommand::manual()).await;
        assert_eq!(service.results().len(), 1);

        let summary = service.handle_event(&event).await.unwrap();
        assert_eq!(summary.evaluated, 1);
        assert!(service.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_after_each_period() {
        let check = ScriptedCheck::new("Scheduled", vec![Ok(Severity::Ok)]);
        let service = service(vec![check.clone()]);

        let config = HealthConfig {
            schedule_interval_minutes: 1,
            ..HealthConfig::default()
        };
        let handle = service.spawn_scheduler(&config).unwrap();
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(check.runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(check.runs.load(Ordering::SeqCst), 2);
        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_schedule_interval_is_rejected() {
        let service = service(Vec::new());
        let config = HealthConfig {
            schedule_interval_minutes: 0,
            ..HealthConfig::default()
        };

        assert!(matches!(
            service.spawn_scheduler(&config),
            Err(HealthError::ConfigurationError(_))
        ));
    }
}
