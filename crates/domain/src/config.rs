//! Configuration structures
//!
//! Plain serde structs; every field has a default so partial files and
//! partial environments are valid. Loading lives in `ciforge-infra`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_FAILURE_THRESHOLD, DEFAULT_GITLAB_URL,
    DEFAULT_HALF_OPEN_MAX_CALLS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS,
    DEFAULT_OPERATION_DEADLINE_SECS, DEFAULT_RECOVERY_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::{CiforgeError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gitlab: GitLabConfig,
    pub resilience: ResilienceConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the resilience layer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.gitlab.base_url.trim().is_empty() {
            return Err(CiforgeError::Config("gitlab.base_url must not be empty".to_string()));
        }
        if self.gitlab.service_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(CiforgeError::Config("gitlab.service_name must not be blank".to_string()));
        }
        self.resilience.circuit_breaker.validate()?;
        self.resilience.retry.validate()?;
        Ok(())
    }
}

/// Remote GitLab endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    pub base_url: String,
    /// Name used in user-facing failure messages; unset keeps the error
    /// translator's default ("GitLab")
    pub service_name: Option<String>,
    /// Per-request transport timeout
    pub request_timeout_seconds: u64,
    /// Coarse outer deadline for one resilient operation, retries included
    pub operation_deadline_seconds: u64,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITLAB_URL.to_string(),
            service_name: None,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            operation_deadline_seconds: DEFAULT_OPERATION_DEADLINE_SECS,
        }
    }
}

impl GitLabConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn operation_deadline(&self) -> Duration {
        Duration::from_secs(self.operation_deadline_seconds)
    }
}

/// Circuit breaker and retry settings for the GitLab dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub circuit_breaker: CircuitBreakerSettings,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout_seconds: u64,
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout_seconds: DEFAULT_RECOVERY_TIMEOUT_SECS,
            half_open_max_calls: DEFAULT_HALF_OPEN_MAX_CALLS,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(CiforgeError::Config(
                "resilience.circuit_breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }
        if self.half_open_max_calls == 0 {
            return Err(CiforgeError::Config(
                "resilience.circuit_breaker.half_open_max_calls must be greater than 0"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(CiforgeError::Config(
                "resilience.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(CiforgeError::Config(format!(
                "resilience.retry.max_delay_ms ({}) must not be below base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `ciforge_core=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}
