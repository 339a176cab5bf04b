//! Single entry point for calls into a protected dependency
//!
//! [`ResilienceFacade`] composes the circuit breaker, the retry executor and
//! the error translator:
//!
//! 1. Ask the breaker for a permit. If it refuses, return `CircuitOpen`
//!    without invoking the operation.
//! 2. Run the operation through the [`RetryExecutor`]. Before every retry the
//!    permit is checked against the breaker; if the breaker has changed state
//!    since admission (tripped open by another caller, or already half-open
//!    with its own probes), the loop ends with `CircuitOpen` instead of
//!    retrying on a stale permit.
//! 3. Report the terminal outcome to the breaker: success resets it, failure
//!    counts against it, cancellation is not counted.
//!
//! `max_attempts × max_delay` only bounds the backoff, not the latency of the
//! operation itself. Callers that need a hard bound use
//! [`ResilienceFacade::try_execute_within`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::circuit_breaker::{CircuitBreaker, Clock, SystemClock};
use super::retry::{RetryExecutor, RetryPolicy};
use super::translator::{ErrorTranslator, RawFailure};
use crate::error::{ErrorKind, OperationFailure, OperationOutcome};

/// Breaker + retry + translation around one remote dependency
pub struct ResilienceFacade<C: Clock = SystemClock> {
    breaker: Arc<CircuitBreaker<C>>,
    translator: ErrorTranslator,
}

impl<C: Clock> Clone for ResilienceFacade<C> {
    fn clone(&self) -> Self {
        Self { breaker: Arc::clone(&self.breaker), translator: self.translator.clone() }
    }
}

impl<C: Clock> std::fmt::Debug for ResilienceFacade<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceFacade")
            .field("breaker", &self.breaker)
            .field("service", &self.translator.service())
            .finish()
    }
}

impl<C: Clock> ResilienceFacade<C> {
    /// Wrap a shared breaker with the default translator
    pub fn new(breaker: Arc<CircuitBreaker<C>>) -> Self {
        Self { breaker, translator: ErrorTranslator::default() }
    }

    /// Replace the translator (e.g. to name a self-hosted instance)
    #[must_use]
    pub fn with_translator(mut self, translator: ErrorTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker<C>> {
        &self.breaker
    }

    pub fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }

    /// Run `operation` under breaker protection and `policy`
    #[instrument(skip_all, fields(breaker = %self.breaker.name(), max_attempts = policy.max_attempts()))]
    pub async fn try_execute<F, Fut, T>(&self, operation: F, policy: &RetryPolicy) -> OperationOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        self.run(operation, policy, None).await
    }

    /// Like [`Self::try_execute`], aborting when `token` is cancelled
    ///
    /// Cancellation yields a `Cancelled` failure and is not counted against
    /// the breaker.
    #[instrument(skip_all, fields(breaker = %self.breaker.name(), max_attempts = policy.max_attempts()))]
    pub async fn try_execute_with_cancel<F, Fut, T>(
        &self,
        operation: F,
        policy: &RetryPolicy,
        token: &CancellationToken,
    ) -> OperationOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        self.run(operation, policy, Some(token.clone())).await
    }

    /// Like [`Self::try_execute`], bounded by a coarse outer deadline
    ///
    /// When the deadline elapses the in-flight attempt or backoff is
    /// cancelled and the call resolves to `Cancelled`. The breaker permit is
    /// always resolved before this returns.
    #[instrument(skip_all, fields(breaker = %self.breaker.name(), deadline = ?deadline))]
    pub async fn try_execute_within<F, Fut, T>(
        &self,
        operation: F,
        policy: &RetryPolicy,
        deadline: Duration,
    ) -> OperationOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        let token = CancellationToken::new();
        let run = self.run(operation, policy, Some(token.clone()));
        tokio::pin!(run);

        tokio::select! {
            outcome = &mut run => outcome,
            () = tokio::time::sleep(deadline) => {
                token.cancel();
                match run.await {
                    OperationOutcome::Failure(failure) if failure.is_cancelled() => {
                        warn!(?deadline, "Call abandoned at caller deadline");
                        OperationOutcome::Failure(OperationFailure {
                            message: format!(
                                "{} (deadline of {:?} exceeded)",
                                failure.message, deadline
                            ),
                            ..failure
                        })
                    }
                    other => other,
                }
            }
        }
    }

    async fn run<F, Fut, T>(
        &self,
        operation: F,
        policy: &RetryPolicy,
        cancel: Option<CancellationToken>,
    ) -> OperationOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RawFailure>>,
    {
        let permit = match self.breaker.try_acquire() {
            Ok(permit) => permit,
            Err(open) => {
                debug!(state = %open.state, "Call rejected by circuit breaker");
                let failure = self
                    .translator
                    .translate(&RawFailure::CircuitOpen)
                    .with_retry_after(open.retry_in);
                return OperationOutcome::Failure(failure);
            }
        };

        let mut executor = RetryExecutor::new(policy.clone(), self.translator.clone());
        if let Some(token) = cancel {
            executor = executor.with_cancellation(token);
        }

        let breaker = &self.breaker;
        let translator = &self.translator;
        let admitted = &permit;
        let retry = executor
            .execute_gated(operation, |last| {
                (!breaker.is_current(admitted)).then(|| {
                    let open = translator.translate(&RawFailure::CircuitOpen);
                    OperationFailure {
                        message: format!("{} Last error: {}", open.message, last.message),
                        ..open
                    }
                })
            })
            .await;

        match &retry.outcome {
            OperationOutcome::Success(_) => self.breaker.record_success(permit),
            OperationOutcome::Failure(failure) if failure.kind.counts_against_breaker() => {
                debug!(kind = %failure.kind, attempts = retry.attempts, "Reporting failure to circuit breaker");
                self.breaker.record_failure(permit);
            }
            OperationOutcome::Failure(failure) => {
                debug_assert_eq!(failure.kind, ErrorKind::Cancelled);
                self.breaker.release(permit);
            }
        }

        retry.outcome
    }
}
