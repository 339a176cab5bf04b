//! Failure classification for remote calls
//!
//! Turns a raw failure signal (an HTTP status, a connection error, a
//! deadline) into an [`OperationFailure`]: an [`ErrorKind`], a retriability
//! flag, and a message a person can act on.

use std::borrow::Cow;
use std::time::Duration;

use thiserror::Error;

use crate::error::{ErrorKind, OperationFailure};

/// Service name used in messages when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "GitLab";

/// Raw failure signal produced by a remote operation
///
/// Transport adapters convert their own error types into this enum; the
/// resilience layer never looks at transport details beyond it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RawFailure {
    /// The remote side answered with a non-success status
    #[error("HTTP status {code}")]
    Status { code: u16, retry_after: Option<Duration> },

    /// A connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The remote host name could not be resolved
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// The call exceeded its own deadline
    #[error("deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// A circuit breaker refused the call
    #[error("circuit breaker open")]
    CircuitOpen,

    /// The caller cancelled the call
    #[error("operation cancelled")]
    Cancelled,

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl RawFailure {
    /// A bare status failure without a retry hint
    pub const fn status(code: u16) -> Self {
        Self::Status { code, retry_after: None }
    }

    pub fn other<S: Into<String>>(detail: S) -> Self {
        Self::Other(detail.into())
    }
}

impl From<std::io::Error> for RawFailure {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;
        match err.kind() {
            Io::TimedOut => Self::Timeout(Duration::ZERO),
            Io::ConnectionRefused
            | Io::ConnectionReset
            | Io::ConnectionAborted
            | Io::NotConnected
            | Io::AddrNotAvailable
            | Io::BrokenPipe => Self::Connect(err.to_string()),
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Classifies raw failures into error kinds with user-facing messages
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    service: Cow<'static, str>,
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl ErrorTranslator {
    /// Create a translator whose messages name `service`
    pub fn new<S: Into<Cow<'static, str>>>(service: S) -> Self {
        Self { service: service.into() }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Classify a raw failure
    pub fn translate(&self, raw: &RawFailure) -> OperationFailure {
        let service = self.service.as_ref();
        match raw {
            RawFailure::Status { code, retry_after } => self.translate_status(*code, *retry_after),
            RawFailure::Connect(detail) => OperationFailure::new(
                ErrorKind::Network,
                format!(
                    "Network error: could not open a connection to {service} ({detail}). Check \
                     your network connection and try again"
                ),
            ),
            RawFailure::Dns(detail) => OperationFailure::new(
                ErrorKind::Network,
                format!(
                    "Network error: could not resolve the {service} host ({detail}). Check your \
                     connection and the configured URL"
                ),
            ),
            RawFailure::Timeout(after) => {
                let message = if after.is_zero() {
                    format!("Request to {service} failed with a timeout")
                } else {
                    format!("Request to {service} failed with a timeout after {after:?}")
                };
                OperationFailure::new(ErrorKind::Timeout, message)
            }
            RawFailure::CircuitOpen => OperationFailure::new(
                ErrorKind::CircuitOpen,
                format!(
                    "{service} is temporarily unavailable: requests are paused after repeated \
                     failures"
                ),
            ),
            RawFailure::Cancelled => OperationFailure::new(
                ErrorKind::Cancelled,
                format!("Request to {service} was cancelled"),
            ),
            RawFailure::Other(detail) => OperationFailure::new(
                ErrorKind::Unknown,
                format!("Unexpected {service} failure: {detail}"),
            ),
        }
    }

    fn translate_status(&self, code: u16, retry_after: Option<Duration>) -> OperationFailure {
        let service = self.service.as_ref();
        match code {
            401 => OperationFailure::new(
                ErrorKind::Unauthorized,
                format!(
                    "{service} authentication failed: the access token is missing, expired or \
                     invalid"
                ),
            ),
            403 => OperationFailure::new(
                ErrorKind::Forbidden,
                format!(
                    "{service} denied the request: the access token does not have permission \
                     for this project"
                ),
            ),
            404 => OperationFailure::new(
                ErrorKind::NotFound,
                format!(
                    "{service} resource not found: check the project path and that your token \
                     can see it"
                ),
            ),
            429 => {
                let message = match retry_after {
                    Some(delay) => format!(
                        "{service} rate limit exceeded: {service} asked to wait {}s",
                        delay.as_secs().max(1)
                    ),
                    None => format!("{service} rate limit exceeded"),
                };
                OperationFailure::new(ErrorKind::RateLimited, message).with_retry_after(retry_after)
            }
            500..=599 => OperationFailure::new(
                ErrorKind::ServerError,
                format!(
                    "{service} server error (HTTP {code}): the service may be degraded, try again \
                     in a few moments"
                ),
            ),
            _ => OperationFailure::new(
                ErrorKind::Unknown,
                format!("Unexpected response from {service} (HTTP {code})"),
            ),
        }
    }
}
