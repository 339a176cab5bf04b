//! Retry with capped exponential backoff
//!
//! The executor invokes an async operation, classifies each failure through
//! the [`ErrorTranslator`], and retries only transient failures while
//! attempts remain. The wait between attempts is
//! `min(base_delay * 2^(attempt - 1), max_delay)`, or the remote
//! `Retry-After` hint (capped at `max_delay`) for rate-limited calls.
//!
//! The backoff wait is the only suspension point besides the operation
//! itself. Both race against an optional [`CancellationToken`], so an
//! external cancellation aborts mid-backoff instead of finishing the
//! remaining attempts.
//!
//! Callers are responsible for only wrapping idempotent operations.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::translator::{ErrorTranslator, RawFailure};
use super::{ConfigError, ConfigResult};
use crate::error::{ErrorKind, OperationFailure, OperationOutcome};

/// Retry budget and backoff bounds for one call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a validated policy
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> ConfigResult<Self> {
        let policy = Self { max_attempts, base_delay, max_delay };
        policy.validate()?;
        Ok(policy)
    }

    /// Create a configuration builder starting from the defaults
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// A policy that makes a single attempt
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Total invocations allowed, first try included
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        if self.max_delay < self.base_delay {
            return Err(ConfigError::Invalid {
                message: "max_delay must not be shorter than base_delay".to_string(),
            });
        }

        Ok(())
    }

    /// Wait after the `attempt`-th failed attempt (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Wait before retrying `failure`, honoring a remote retry hint
    pub fn delay_for(&self, failure: &OperationFailure, attempt: u32) -> Duration {
        match failure.retry_after {
            Some(hint) if failure.kind == ErrorKind::RateLimited => hint.min(self.max_delay),
            _ => self.backoff_delay(attempt),
        }
    }
}

/// Builder for RetryPolicy with fluent API
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self { policy: RetryPolicy::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    pub fn build(self) -> ConfigResult<RetryPolicy> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}

/// Outcome of a retry execution with summary statistics
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub outcome: OperationOutcome<T>,
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// Sum of all backoff waits that completed
    pub total_delay: Duration,
}

impl<T> RetryOutcome<T> {
    /// Consume the statistics and return only the outcome
    pub fn into_outcome(self) -> OperationOutcome<T> {
        self.outcome
    }
}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    translator: ErrorTranslator,
    cancel: Option<CancellationToken>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, translator: ErrorTranslator) -> Self {
        Self { policy, translator, cancel: None }
    }

    /// Abort attempts and backoff waits when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T>(&self, operation: F) -> OperationOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        self.execute_with_outcome(operation).await.into_outcome()
    }

    /// Execute an operation with retry logic and return outcome statistics
    pub async fn execute_with_outcome<F, Fut, T>(&self, operation: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        self.execute_gated(operation, |_| None).await
    }

    /// Execute with a gate consulted before every retry
    ///
    /// After a retriable failure, and before waiting, `gate` is called with
    /// that failure. Returning `Some(failure)` ends the loop with it.
    #[instrument(skip_all, fields(max_attempts = self.policy.max_attempts))]
    pub async fn execute_gated<F, Fut, T, G>(&self, mut operation: F, mut gate: G) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
        G: FnMut(&OperationFailure) -> Option<OperationFailure>,
    {
        let mut attempts = 0;
        let mut total_delay = Duration::ZERO;

        loop {
            if self.is_cancelled() {
                return self.cancelled(attempts, total_delay);
            }

            attempts += 1;
            debug!("Executing operation (attempt {}/{})", attempts, self.policy.max_attempts);

            let result = match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        () = token.cancelled() => Err(RawFailure::Cancelled),
                        result = operation() => result,
                    }
                }
                None => operation().await,
            };

            let raw = match result {
                Ok(value) => {
                    if attempts > 1 {
                        debug!("Operation succeeded after {} retries", attempts - 1);
                    }
                    return RetryOutcome {
                        outcome: OperationOutcome::Success(value),
                        attempts,
                        total_delay,
                    };
                }
                Err(raw) => raw,
            };

            let failure = self.translator.translate(&raw);

            if !failure.retriable {
                debug!(kind = %failure.kind, "Operation failed with non-retriable error");
                return RetryOutcome { outcome: OperationOutcome::Failure(failure), attempts, total_delay };
            }

            if attempts >= self.policy.max_attempts {
                warn!(
                    kind = %failure.kind,
                    "All retry attempts exhausted after {} tries", attempts
                );
                return RetryOutcome { outcome: OperationOutcome::Failure(failure), attempts, total_delay };
            }

            if let Some(stop) = gate(&failure) {
                debug!(kind = %stop.kind, "Retry gate stopped the retry loop");
                return RetryOutcome { outcome: OperationOutcome::Failure(stop), attempts, total_delay };
            }

            let delay = self.policy.delay_for(&failure, attempts);
            warn!(
                kind = %failure.kind,
                "Operation failed (attempt {}), retrying after {:?}", attempts, delay
            );

            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        () = token.cancelled() => return self.cancelled(attempts, total_delay),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
            total_delay += delay;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    fn cancelled<T>(&self, attempts: u32, total_delay: Duration) -> RetryOutcome<T> {
        debug!("Retry loop cancelled after {} attempts", attempts);
        RetryOutcome {
            outcome: OperationOutcome::Failure(self.translator.translate(&RawFailure::Cancelled)),
            attempts,
            total_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn executor(policy: RetryPolicy) -> RetryExecutor {
        RetryExecutor::new(policy, ErrorTranslator::default())
    }

    fn policy(max_attempts: u32, base_ms: u64, max_ms: u64) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(base_ms), Duration::from_millis(max_ms))
            .unwrap()
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_secs(1));
        assert_eq!(policy.max_delay(), Duration::from_secs(5));
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }

    #[test]
    fn test_policy_validation() {
        assert!(RetryPolicy::builder().max_attempts(0).build().is_err());
        assert!(RetryPolicy::builder()
            .base_delay(Duration::from_secs(10))
            .max_delay(Duration::from_secs(1))
            .build()
            .is_err());
        assert!(RetryPolicy::builder().max_attempts(1).build().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = policy(10, 1000, 5000);
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(5000));
        assert_eq!(policy.backoff_delay(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_rate_limit_hint_is_capped() {
        let policy = policy(3, 100, 2000);
        let hinted = OperationFailure::new(ErrorKind::RateLimited, "slow down")
            .with_retry_after(Some(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(&hinted, 1), Duration::from_millis(2000));

        let short = hinted.clone().with_retry_after(Some(Duration::from_millis(300)));
        assert_eq!(policy.delay_for(&short, 1), Duration::from_millis(300));

        let plain = OperationFailure::new(ErrorKind::ServerError, "down");
        assert_eq!(policy.delay_for(&plain, 2), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let outcome = executor(policy(3, 1000, 5000))
            .execute_with_outcome(|| {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(RawFailure::status(503))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(outcome.outcome, OperationOutcome::Success("ok"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.total_delay, Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retriable_invoked_once() {
        for code in [401, 403, 404, 418] {
            let calls = AtomicU32::new(0);
            let outcome: OperationOutcome<()> = executor(policy(5, 10, 100))
                .execute(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(RawFailure::status(code)) }
                })
                .await;

            assert!(outcome.is_failure());
            assert_eq!(calls.load(Ordering::SeqCst), 1, "status {code}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy_disables_retry() {
        let calls = AtomicU32::new(0);
        let outcome: OperationOutcome<()> = executor(RetryPolicy::no_retry())
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RawFailure::status(500)) }
            })
            .await;

        assert_eq!(outcome.kind(), Some(ErrorKind::ServerError));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_failure() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<()> = executor(policy(4, 10, 40))
            .execute_with_outcome(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RawFailure::Timeout(Duration::from_secs(1))) }
            })
            .await;

        assert_eq!(outcome.outcome.kind(), Some(ErrorKind::Timeout));
        assert_eq!(outcome.attempts, 4);
        // 10 + 20 + 40
        assert_eq!(outcome.total_delay, Duration::from_millis(70));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_stops_loop() {
        let calls = AtomicU32::new(0);
        let outcome: RetryOutcome<()> = executor(policy(5, 10, 100))
            .execute_gated(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(RawFailure::status(502)) }
                },
                |_| Some(OperationFailure::new(ErrorKind::CircuitOpen, "open")),
            )
            .await;

        assert_eq!(outcome.outcome.kind(), Some(ErrorKind::CircuitOpen));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let exec = executor(policy(5, 60_000, 60_000)).with_cancellation(token.clone());

        let canceller = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        };
        let run = exec.execute_with_outcome(|| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(RawFailure::status(503)) }
        });

        let (outcome, ()) = tokio::join!(run, canceller);

        assert_eq!(outcome.outcome.kind(), Some(ErrorKind::Cancelled));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.total_delay, Duration::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_invokes() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<()> = executor(RetryPolicy::default())
            .with_cancellation(token)
            .execute_with_outcome(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert_eq!(outcome.outcome.kind(), Some(ErrorKind::Cancelled));
        assert_eq!(outcome.attempts, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
