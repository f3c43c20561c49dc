//! # Health Checks
//!
//! Event-driven evaluation of registered health checks.
//!
//! ## Architecture
//!
//! ```text
//! trigger (startup | schedule | manual | domain event)
//!     ↓
//! HealthCheckService ── selects checks ──► HealthCheckRegistry
//!     ↓ runs checks (+ server checks)
//! HealthResultCache ── new failure? ──► health_check.failed
//!     ↓
//! health_check.complete
//! ```

pub mod cache;
pub mod check;
pub mod checks;
pub mod registry;
pub mod server_checks;
pub mod service;

pub use cache::HealthResultCache;
pub use check::{
    CheckCondition, CheckResult, EventPredicate, EventSubscription, HealthCheck, Severity,
};
pub use registry::{EventDrivenCheck, HealthCheckRegistry};
pub use server_checks::{NoServerChecks, ServerSideNotificationService};
pub use service::{CheckHealthCommand, CommandTrigger, EvaluationSummary, HealthCheckService};
