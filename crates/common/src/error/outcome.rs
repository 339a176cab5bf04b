//! Explicit success/failure outcome of a resilient call

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::{ErrorClassification, ErrorKind, ErrorSeverity};

/// A classified, human-readable failure
///
/// Produced by the error translator from a raw failure signal. The
/// `retriable` flag is carried as data so callers never have to re-derive it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub retriable: bool,
    /// Delay recommended by the remote side, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<Duration>,
}

impl OperationFailure {
    /// Create a failure whose retriability follows its kind
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self { kind, message: message.into(), retriable: kind.is_retriable(), retry_after: None }
    }

    /// Attach a remote-recommended retry delay
    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Whether this failure was produced by the circuit breaker gate
    pub fn is_circuit_open(&self) -> bool {
        self.kind == ErrorKind::CircuitOpen
    }

    /// Whether the caller cancelled the call
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

impl ErrorClassification for OperationFailure {
    fn is_retryable(&self) -> bool {
        self.retriable
    }

    fn severity(&self) -> ErrorSeverity {
        self.kind.severity()
    }

    fn is_critical(&self) -> bool {
        self.kind.is_critical()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

/// Outcome of a call made through the resilience layer
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome<T> {
    Success(T),
    Failure(OperationFailure),
}

impl<T> OperationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The failure, if this outcome is one
    pub fn failure(&self) -> Option<&OperationFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// The failure kind, if this outcome is a failure
    pub fn kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.kind)
    }

    /// Discard the failure and keep the value, if any
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> OperationOutcome<U> {
        match self {
            Self::Success(value) => OperationOutcome::Success(f(value)),
            Self::Failure(failure) => OperationOutcome::Failure(failure),
        }
    }

    /// Convert into a `Result` for use with `?`
    pub fn into_result(self) -> Result<T, OperationFailure> {
        self.into()
    }
}

impl<T> From<Result<T, OperationFailure>> for OperationOutcome<T> {
    fn from(result: Result<T, OperationFailure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl<T> From<OperationOutcome<T>> for Result<T, OperationFailure> {
    fn from(outcome: OperationOutcome<T>) -> Self {
        match outcome {
            OperationOutcome::Success(value) => Ok(value),
            OperationOutcome::Failure(failure) => Err(failure),
        }
    }
}
