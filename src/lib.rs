#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Healthwatch
//!
//! Self-diagnostics for a media acquisition service: an event-driven health
//! check engine and a debounced queue status broadcaster.
//!
//! ## Overview
//!
//! Health checks are small probes registered once at startup. The
//! [`HealthCheckService`] runs them on application start, on a schedule, on
//! manual request, and whenever a domain event they subscribe to is
//! published. Failing results are cached per check; the first failure of an
//! episode publishes a `health_check.failed` event and every batch ends with
//! `health_check.complete`.
//!
//! High-frequency notifications (queue updates) are coalesced with the
//! fixed-window [`Debouncer`] before clients are told about them.
//!
//! ## Module Organization
//!
//! - [`health`] - Check contract, registry, result cache and service
//! - [`queue`] - Queue status read model and debounced broadcasting
//! - [`utils`] - The [`Debouncer`] primitive
//! - [`events`] - Domain events and the in-process publisher
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthwatch::config::HealthConfig;
//! use healthwatch::events::{DomainEvent, EventPublisher};
//! use healthwatch::health::{HealthCheckService, HealthResultCache, NoServerChecks};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let publisher = EventPublisher::default();
//! let service = HealthCheckService::new(
//!     Vec::new(),
//!     Arc::new(HealthResultCache::new()),
//!     Arc::new(NoServerChecks),
//!     publisher.clone(),
//!     &HealthConfig::default(),
//! );
//!
//! service.spawn_event_listener(publisher.subscribe());
//! publisher.publish(DomainEvent::application_started());
//!
//! for failure in service.results() {
//!     println!("{}: {}", failure.source, failure.message);
//! }
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod health;
pub mod logging;
pub mod queue;
pub mod utils;

pub use config::{ConfigManager, HealthwatchConfig};
pub use error::{HealthError, HealthResult};
pub use events::{DomainEvent, EventPublisher, HealthNotification};
pub use health::{
    CheckCondition, CheckHealthCommand, CheckResult, CommandTrigger, EvaluationSummary,
    EventSubscription, HealthCheck, HealthCheckRegistry, HealthCheckService, HealthResultCache,
    Severity,
};
pub use queue::{QueueStatus, QueueStatusAggregator};
pub use utils::Debouncer;
