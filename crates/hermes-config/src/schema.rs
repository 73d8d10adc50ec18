//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Service identity section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name, used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Deployment environment (e.g. `development`, `production`).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            environment: default_environment(),
        }
    }
}

fn default_service_name() -> String {
    "hermes-service".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Bounded retry policy for event log appends.
///
/// The delay before retry `n` (1-based) is
/// `min(initial_backoff_ms * multiplier^(n-1), max_backoff_ms)`.
///
/// # Example
///
/// ```
/// use hermes_config::RetryConfig;
///
/// let retry = RetryConfig::default();
/// assert_eq!(retry.max_attempts, 5);
/// assert_eq!(retry.initial_backoff_ms, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound of any single delay, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Growth factor between consecutive delays.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

fn default_multiplier() -> f64 {
    2.0
}

/// How the dispatcher picks the topic of a published call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopicStrategy {
    /// One topic per namespace (`projects`).
    #[default]
    PerNamespace,
    /// One topic per call (`projects.create`).
    PerCall,
}

impl FromStr for TopicStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_namespace" => Ok(Self::PerNamespace),
            "per_call" => Ok(Self::PerCall),
            other => Err(format!("expected 'per_namespace' or 'per_call', got '{other}'")),
        }
    }
}

impl fmt::Display for TopicStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerNamespace => f.write_str("per_namespace"),
            Self::PerCall => f.write_str("per_call"),
        }
    }
}

/// Ordering the dispatcher guarantees for published calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderingGuarantee {
    /// Events of one topic are totally ordered by sequence; synchronous
    /// handlers may run concurrently.
    #[default]
    PerTopic,
    /// Additionally, synchronous handlers of one topic run one at a time, in
    /// sequence order.
    SerializedHandlers,
}

impl FromStr for OrderingGuarantee {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_topic" => Ok(Self::PerTopic),
            "serialized_handlers" => Ok(Self::SerializedHandlers),
            other => Err(format!(
                "expected 'per_topic' or 'serialized_handlers', got '{other}'"
            )),
        }
    }
}

/// Dispatch section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Publish retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Deadline of one request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Topic naming.
    #[serde(default)]
    pub topic_strategy: TopicStrategy,

    /// Ordering guarantee.
    #[serde(default)]
    pub ordering: OrderingGuarantee,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout_ms: default_request_timeout_ms(),
            topic_strategy: TopicStrategy::default(),
            ordering: OrderingGuarantee::default(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Gateway section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether this service publishes a gateway route table.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// External prefix the gateway mounts the service under.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_path: default_base_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_path() -> String {
    "/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_backoff_ms, 50);
        assert_eq!(retry.max_backoff_ms, 2_000);
        assert!((retry.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dispatch_section_from_toml() {
        let dispatch: DispatchConfig = toml::from_str(
            r#"
            topic_strategy = "per_call"
            ordering = "serialized_handlers"

            [retry]
            max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(dispatch.topic_strategy, TopicStrategy::PerCall);
        assert_eq!(dispatch.ordering, OrderingGuarantee::SerializedHandlers);
        assert_eq!(dispatch.retry.max_attempts, 3);
        assert_eq!(dispatch.retry.initial_backoff_ms, 50);
        assert_eq!(dispatch.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RetryConfig, _> = toml::from_str("max_attempt = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("PER_CALL".parse::<TopicStrategy>(), Ok(TopicStrategy::PerCall));
        assert_eq!(TopicStrategy::PerNamespace.to_string(), "per_namespace");
        assert!("per_tenant".parse::<TopicStrategy>().is_err());
        assert_eq!(
            "per_topic".parse::<OrderingGuarantee>(),
            Ok(OrderingGuarantee::PerTopic)
        );
    }
}
