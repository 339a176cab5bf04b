//! Resilience patterns for calls into a remote dependency
//!
//! This module provides the building blocks every GitLab call goes through:
//! - **Circuit Breaker**: stops calling a dependency after repeated failures
//!   and probes it again after a recovery timeout
//! - **Retry Logic**: bounded retries with capped exponential backoff
//! - **Error Translation**: turns raw failure signals into classified,
//!   user-facing [`OperationFailure`](crate::error::OperationFailure)s
//! - **Facade**: composes the three so callers make one call and get one
//!   [`OperationOutcome`](crate::error::OperationOutcome) back
//!
//! ## Sharing
//!
//! A [`CircuitBreaker`] is shared by every caller that talks to the same
//! dependency. Wrap it in an `Arc` (or clone it; clones share state) and hand
//! it to each [`ResilienceFacade`]. Retry policies are plain values and can be
//! chosen per call.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ciforge_common::resilience::{
//!     CircuitBreaker, CircuitBreakerConfig, RawFailure, ResilienceFacade, RetryPolicy,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = Arc::new(CircuitBreaker::new("gitlab", CircuitBreakerConfig::default())?);
//! let facade = ResilienceFacade::new(breaker);
//!
//! let outcome = facade
//!     .try_execute(|| async { Ok::<_, RawFailure>("main") }, &RetryPolicy::default())
//!     .await;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod facade;
pub mod retry;
pub mod translator;

use thiserror::Error;

/// Invalid resilience configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export circuit breaker types
pub use circuit_breaker::{
    BreakerError, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitOpenError, CircuitState, Clock, MockClock, SystemClock,
};
pub use facade::ResilienceFacade;
// Re-export retry types
pub use retry::{RetryExecutor, RetryOutcome, RetryPolicy, RetryPolicyBuilder};
pub use translator::{ErrorTranslator, RawFailure, DEFAULT_SERVICE_NAME};
