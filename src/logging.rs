//! # Structured Logging Module
//!
//! Environment-aware structured logging for health evaluation runs and
//! debounced broadcasts.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::health::Severity;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` takes precedence over the environment default. Set
/// `HEALTHWATCH_LOG_FORMAT=json` for machine-readable output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var("HEALTHWATCH_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already be installed by the host application
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized, keeping it");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var("HEALTHWATCH_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
        .to_lowercase()
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log the outcome of a single health check
pub fn log_health_check_result(source: &str, severity: Severity, message: &str) {
    match severity {
        Severity::Ok => tracing::debug!(
            source = %source,
            severity = %severity,
            "HEALTH_CHECK_RESULT"
        ),
        _ => tracing::info!(
            source = %source,
            severity = %severity,
            message = %message,
            "HEALTH_CHECK_RESULT"
        ),
    }
}

/// Log the outcome of an evaluation batch
pub fn log_evaluation(trigger: &str, check_count: usize, failure_count: usize) {
    tracing::info!(
        trigger = %trigger,
        check_count = check_count,
        failure_count = failure_count,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        "HEALTH_EVALUATION"
    );
}
