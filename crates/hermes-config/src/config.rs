//! Main configuration types.
//!
//! This module provides the top-level [`HermesConfig`] struct.

use std::time::Duration;

use hermes_telemetry::{LogFormat, TelemetryConfig};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, DispatchConfig, GatewayConfig, ServiceConfig};

/// Complete Hermes service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.dispatch.retry.max_attempts, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Service identity.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Dispatch (retry, deadline, topics, ordering).
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Gateway route table publication.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl HermesConfig {
    /// Deadline applied to every request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.request_timeout_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first field found invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("service.name", "must not be empty"));
        }

        let retry = &self.dispatch.retry;
        if retry.max_attempts == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.retry.max_attempts",
                "must be at least 1",
            ));
        }
        if !retry.multiplier.is_finite() || retry.multiplier < 1.0 {
            return Err(ConfigError::invalid_value(
                "dispatch.retry.multiplier",
                "must be a finite number of at least 1.0",
            ));
        }
        if retry.initial_backoff_ms > retry.max_backoff_ms {
            return Err(ConfigError::invalid_value(
                "dispatch.retry.initial_backoff_ms",
                format!("must not exceed max_backoff_ms ({})", retry.max_backoff_ms),
            ));
        }

        if self.dispatch.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if !self.gateway.base_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "gateway.base_path",
                format!("must start with '/': {}", self.gateway.base_path),
            ));
        }

        if self.telemetry.logging.enabled {
            hermes_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
                .map_err(|e| ConfigError::invalid_value("telemetry.logging.level", e.to_string()))?;
        }

        let buckets = &self.telemetry.metrics.duration_buckets;
        if buckets.is_empty() || !buckets.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.duration_buckets",
                "must be non-empty and strictly increasing",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.service.environment = "development".to_string();
        config.telemetry.logging = hermes_telemetry::LogConfig::development();
        config
    }

    /// Production preset: JSON logs at info.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.service.environment = "production".to_string();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HermesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_presets() {
        assert_eq!(HermesConfig::development().telemetry.logging.level, "debug");
        assert_eq!(
            HermesConfig::production().telemetry.logging.format,
            LogFormat::Json
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = HermesConfig::default();
        config.dispatch.retry.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "dispatch.retry.max_attempts"
        ));
    }

    #[test]
    fn test_backoff_bounds() {
        let mut config = HermesConfig::default();
        config.dispatch.retry.initial_backoff_ms = 5_000;
        assert!(config.validate().is_err());

        let mut config = HermesConfig::default();
        config.dispatch.retry.multiplier = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_path_must_be_absolute() {
        let mut config = HermesConfig::default();
        config.gateway.base_path = "files".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = HermesConfig::default();
        config.telemetry.logging.level = "hermes_server=loudest".to_string();
        assert!(config.validate().is_err());
    }
}
