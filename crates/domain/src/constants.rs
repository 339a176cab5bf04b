//! Application constants
//!
//! Centralized location for the domain-level defaults used throughout the
//! application.

// GitLab access
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OPERATION_DEADLINE_SECS: u64 = 120;

// Circuit breaker
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 2;

// Retry policy
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Warning attached to every degraded analysis result
pub const DEGRADED_MODE_WARNING: &str =
    "Degraded mode: GitLab analysis was unavailable, so conventional defaults for the project \
     type were used. Review the generated commands before relying on them.";
