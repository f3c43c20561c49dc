//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles file discovery,
//! environment detection and layering of overrides.

use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::HealthwatchConfig;
use crate::constants::system;
use crate::error::HealthResult;

const BASE_CONFIG_NAME: &str = "healthwatch";

/// Loaded configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: HealthwatchConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> HealthResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> HealthResult<Arc<ConfigManager>> {
        let environment = crate::logging::get_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Useful in tests to avoid mutating process-wide environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> HealthResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::build(&config_directory, environment)?;
        config.validate()?;

        debug!(
            environment = %environment,
            schedule_interval_minutes = config.health.schedule_interval_minutes,
            event_debounce_ms = config.health.event_debounce_ms,
            broadcast_debounce_seconds = config.queue_status.broadcast_debounce_seconds,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration
    pub fn from_config(config: HealthwatchConfig) -> HealthResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: crate::logging::get_environment(),
            config_directory: PathBuf::from("config"),
        }))
    }

    fn build(config_directory: &Path, environment: &str) -> HealthResult<HealthwatchConfig> {
        let base = config_directory.join(format!("{BASE_CONFIG_NAME}.toml"));
        let overrides = config_directory.join(format!("{BASE_CONFIG_NAME}.{environment}.toml"));

        let settings = Config::builder()
            .add_source(Config::try_from(&HealthwatchConfig::default())?)
            .add_source(File::from(base).format(FileFormat::Toml).required(false))
            .add_source(File::from(overrides).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(system::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &HealthwatchConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }
}
