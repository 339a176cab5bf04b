//! Failure taxonomy shared by every call into a remote dependency
//!
//! This module provides the error vocabulary used by the resilience layer:
//!
//! 1. **`ErrorKind`**: the categorical classification of a failed remote call.
//!    It decides retriability and drives user-facing messaging.
//!
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by their characteristics (retryability, severity, criticality).
//!
//! 3. **`ErrorSeverity` enum**: a unified severity level system for logging
//!    and alerting.
//!
//! 4. **`OperationOutcome` / `OperationFailure`**: the explicit sum type every
//!    resilient call returns. Failures are data, not control flow.
//!
//! ## Retriability
//!
//! | Kind | Retriable | Severity |
//! |------|-----------|----------|
//! | `Unauthorized` | no | Error |
//! | `Forbidden` | no | Error |
//! | `NotFound` | no | Info |
//! | `RateLimited` | yes | Warning |
//! | `ServerError` | yes | Warning |
//! | `Network` | yes | Error |
//! | `Timeout` | yes | Warning |
//! | `CircuitOpen` | no | Warning |
//! | `Cancelled` | no | Info |
//! | `Unknown` | no | Critical |
//!
//! `Unknown` is deliberately non-retriable so unexpected faults surface
//! immediately instead of being hidden behind retries.
//!
//! ## Example
//!
//! ```rust
//! use ciforge_common::error::{ErrorClassification, ErrorKind, OperationFailure};
//!
//! let failure = OperationFailure::new(ErrorKind::ServerError, "GitLab server error (HTTP 502)");
//! assert!(failure.is_retryable());
//! assert_eq!(failure.kind, ErrorKind::ServerError);
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod outcome;

pub use outcome::{OperationFailure, OperationOutcome};

/// Categorical classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials missing, expired or rejected (HTTP 401)
    Unauthorized,
    /// Credentials valid but lacking permission (HTTP 403)
    Forbidden,
    /// The requested resource does not exist (HTTP 404)
    NotFound,
    /// The remote service throttled the caller (HTTP 429)
    RateLimited,
    /// The remote service failed internally (HTTP 5xx)
    ServerError,
    /// Connection or DNS failure before a response was received
    Network,
    /// The remote call exceeded its own deadline
    Timeout,
    /// The circuit breaker refused the call without invoking it
    CircuitOpen,
    /// The caller cancelled the call or its outer deadline elapsed
    Cancelled,
    /// Anything that does not fit another kind
    Unknown,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::RateLimited,
        ErrorKind::ServerError,
        ErrorKind::Network,
        ErrorKind::Timeout,
        ErrorKind::CircuitOpen,
        ErrorKind::Cancelled,
        ErrorKind::Unknown,
    ];

    /// Whether failures of this kind are transient and worth retrying locally
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError | Self::Network | Self::Timeout)
    }

    /// Whether a terminal failure of this kind is reported to the circuit
    /// breaker as a dependency fault
    ///
    /// Cancellation is initiated by the caller and says nothing about the
    /// health of the dependency.
    pub const fn counts_against_breaker(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Stable snake_case identifier, used in structured log fields
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::CircuitOpen => "circuit_open",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard interface for classifying errors
///
/// Implemented by [`ErrorKind`] and [`OperationFailure`] so that logging and
/// retry decisions read the same way regardless of which one is at hand.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as:
    /// - Network failures
    /// - Rate limiting
    /// - Server-side faults
    /// - Request timeouts
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging and alerting decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the remote side recommended a specific
    /// delay (e.g. a `Retry-After` header).
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorClassification for ErrorKind {
    fn is_retryable(&self) -> bool {
        self.is_retriable()
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unauthorized | Self::Forbidden | Self::Network => ErrorSeverity::Error,
            Self::NotFound | Self::Cancelled => ErrorSeverity::Info,
            Self::RateLimited | Self::ServerError | Self::Timeout | Self::CircuitOpen => {
                ErrorSeverity::Warning
            }
            Self::Unknown => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds_are_retriable() {
        let retriable: Vec<_> = ErrorKind::ALL.into_iter().filter(|k| k.is_retriable()).collect();
        assert_eq!(
            retriable,
            vec![
                ErrorKind::RateLimited,
                ErrorKind::ServerError,
                ErrorKind::Network,
                ErrorKind::Timeout
            ]
        );
    }

    #[test]
    fn test_only_cancellation_is_exempt_from_breaker_accounting() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.counts_against_breaker(), kind != ErrorKind::Cancelled, "{kind}");
        }
    }

    #[test]
    fn test_unknown_is_critical() {
        assert!(ErrorKind::Unknown.is_critical());
        assert_eq!(ErrorKind::Unknown.severity(), ErrorSeverity::Critical);
        assert!(!ErrorKind::ServerError.is_critical());
    }

    #[test]
    fn test_display_matches_serde_name() {
        for kind in ErrorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
