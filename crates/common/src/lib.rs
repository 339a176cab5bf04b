//! Shared building blocks for the ciforge crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: the failure taxonomy (`ErrorKind`, `OperationOutcome`)
//! - `runtime`: async resilience (circuit breaker, retry, error translation)
//! - `observability`: tracing instrumentation (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorKind, ErrorSeverity, OperationFailure, OperationOutcome};
#[cfg(feature = "runtime")]
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerMetrics,
    CircuitState, Clock, ErrorTranslator, MockClock, RawFailure, ResilienceFacade, RetryExecutor,
    RetryPolicy, SystemClock,
};
