//! Circuit breaker for a protected remote dependency
//!
//! The breaker stops calling a dependency that keeps failing, then probes it
//! after a cooldown.
//!
//! # States
//! ```text
//! Closed   → Open:     consecutive_failures reaches failure_threshold
//! Open     → HalfOpen: recovery_timeout elapsed since the last transition
//! HalfOpen → Closed:   first probe succeeds
//! HalfOpen → Open:     first probe fails (recovery timer restarts)
//! ```
//!
//! Every read and write of the state, counters and transition timestamp goes
//! through one mutex per breaker, so concurrent callers cannot lose updates.
//! Clones share that state: create one breaker per dependency at startup and
//! hand clones (or an `Arc`) to every caller.
//!
//! Callers either use the [`CircuitBreaker::call`] / [`CircuitBreaker::execute`]
//! conveniences, or drive the protocol themselves with
//! [`CircuitBreaker::try_acquire`] and one of `record_success`,
//! `record_failure` or `release` on the returned [`CallPermit`].

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{ConfigError, ConfigResult};

//==============================================================================
// Time Abstraction for Testability
//==============================================================================

/// Trait for time operations to enable deterministic testing
///
/// Production breakers read real monotonic time; tests drive a [`MockClock`]
/// to cross the recovery timeout without sleeping.
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed time, so a test can keep one handle and give
/// another to the breaker.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<StdMutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(StdMutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

//==============================================================================
// Configuration
//==============================================================================

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, allowing limited probes to test recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time to wait in Open before admitting a probe
    pub recovery_timeout: Duration,
    /// Maximum number of probes admitted while half-open
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            half_open_max_calls: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.half_open_max_calls == 0 {
            return Err(ConfigError::Invalid {
                message: "half_open_max_calls must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.recovery_timeout = timeout;
        self
    }

    pub fn half_open_max_calls(mut self, max_calls: u32) -> Self {
        self.config.half_open_max_calls = max_calls;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//==============================================================================
// Errors and Metrics
//==============================================================================

/// The breaker refused a call without invoking it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit breaker '{name}' is {state}, rejecting calls")]
pub struct CircuitOpenError {
    pub name: String,
    pub state: CircuitState,
    /// Time left until a probe will be admitted, when known
    pub retry_in: Option<Duration>,
}

/// Errors returned by the [`CircuitBreaker::call`] and
/// [`CircuitBreaker::execute`] conveniences
#[derive(Debug, Error)]
pub enum BreakerError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The breaker rejected the call; the operation was not invoked
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// The underlying operation failed
    #[error("Operation failed")]
    OperationFailed {
        #[source]
        source: E,
    },
}

/// Point-in-time snapshot of a breaker, for logging and tests
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub half_open_calls: u32,
    pub total_calls: u64,
    pub rejected_calls: u64,
    pub last_transition_at: Instant,
}

//==============================================================================
// Breaker
//==============================================================================

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_transition_at: Instant,
    half_open_calls: u32,
    /// Bumped on every transition so outcomes of calls admitted under an
    /// earlier state are ignored.
    epoch: u64,
    total_calls: u64,
    rejected_calls: u64,
}

impl BreakerState {
    fn new(now: Instant) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_transition_at: now,
            half_open_calls: 0,
            epoch: 0,
            total_calls: 0,
            rejected_calls: 0,
        }
    }

    fn transition(&mut self, to: CircuitState, now: Instant) {
        self.state = to;
        self.last_transition_at = now;
        self.half_open_calls = 0;
        self.epoch = self.epoch.wrapping_add(1);
        if to != CircuitState::Open {
            self.consecutive_failures = 0;
        }
    }
}

/// Admission ticket for one call through the breaker
///
/// Resolve it with [`CircuitBreaker::record_success`],
/// [`CircuitBreaker::record_failure`] or [`CircuitBreaker::release`]. A permit
/// dropped unresolved is treated as released, so an abandoned half-open probe
/// gives its slot back.
#[must_use = "resolve the permit with record_success, record_failure or release"]
pub struct CallPermit {
    shared: Arc<Mutex<BreakerState>>,
    epoch: u64,
    probe: bool,
    resolved: bool,
}

impl CallPermit {
    /// Whether this permit was admitted as a half-open probe
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    fn give_back(&mut self) {
        self.resolved = true;
        let mut state = self.shared.lock();
        if self.probe && state.epoch == self.epoch && state.state == CircuitState::HalfOpen {
            state.half_open_calls = state.half_open_calls.saturating_sub(1);
        }
    }
}

impl fmt::Debug for CallPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallPermit")
            .field("epoch", &self.epoch)
            .field("probe", &self.probe)
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.resolved {
            debug!(epoch = self.epoch, probe = self.probe, "Circuit breaker permit dropped unresolved");
            self.give_back();
        }
    }
}

/// Circuit breaker guarding one remote dependency
pub struct CircuitBreaker<C: Clock = SystemClock> {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    shared: Arc<Mutex<BreakerState>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &state.state)
            .field("consecutive_failures", &state.consecutive_failures)
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker using the system clock
    pub fn new<S: Into<String>>(name: S, config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(name, config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker with a custom clock (useful for testing)
    pub fn with_clock<S: Into<String>>(
        name: S,
        config: CircuitBreakerConfig,
        clock: C,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let now = clock.now();

        Ok(Self {
            name: Arc::from(name.into()),
            config,
            shared: Arc::new(Mutex::new(BreakerState::new(now))),
            clock: Arc::new(clock),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask the breaker to admit one call
    ///
    /// In Open, admits nothing until the recovery timeout has elapsed; the
    /// first call after that flips the breaker to HalfOpen and is admitted as
    /// a probe. In HalfOpen, admits at most `half_open_max_calls` probes.
    pub fn try_acquire(&self) -> Result<CallPermit, CircuitOpenError> {
        let now = self.clock.now();
        let mut state = self.shared.lock();

        let probe = match state.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let elapsed = now.saturating_duration_since(state.last_transition_at);
                if elapsed < self.config.recovery_timeout {
                    state.rejected_calls += 1;
                    debug!(breaker = %self.name, "Circuit breaker rejecting call - state: OPEN");
                    return Err(CircuitOpenError {
                        name: self.name.to_string(),
                        state: CircuitState::Open,
                        retry_in: Some(self.config.recovery_timeout - elapsed),
                    });
                }
                state.transition(CircuitState::HalfOpen, now);
                info!(breaker = %self.name, "Circuit breaker half-open, admitting probe");
                true
            }
            CircuitState::HalfOpen => {
                if state.half_open_calls >= self.config.half_open_max_calls {
                    state.rejected_calls += 1;
                    debug!(breaker = %self.name, "Circuit breaker probe budget exhausted");
                    return Err(CircuitOpenError {
                        name: self.name.to_string(),
                        state: CircuitState::HalfOpen,
                        retry_in: None,
                    });
                }
                true
            }
        };

        if probe {
            state.half_open_calls += 1;
        }
        state.total_calls += 1;

        Ok(CallPermit { shared: Arc::clone(&self.shared), epoch: state.epoch, probe, resolved: false })
    }

    /// Report that an admitted call succeeded
    pub fn record_success(&self, mut permit: CallPermit) {
        permit.resolved = true;
        let now = self.clock.now();
        let mut state = self.shared.lock();

        if state.epoch != permit.epoch {
            debug!(breaker = %self.name, "Ignoring success from a superseded breaker state");
            return;
        }

        match state.state {
            CircuitState::Closed => state.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                state.transition(CircuitState::Closed, now);
                info!(breaker = %self.name, "Circuit breaker closed after successful probe");
            }
            CircuitState::Open => {
                warn!(breaker = %self.name, "Received success while circuit is open");
            }
        }
    }

    /// Report that an admitted call failed because of the dependency
    pub fn record_failure(&self, mut permit: CallPermit) {
        permit.resolved = true;
        let now = self.clock.now();
        let mut state = self.shared.lock();

        if state.epoch != permit.epoch {
            debug!(breaker = %self.name, "Ignoring failure from a superseded breaker state");
            return;
        }

        match state.state {
            CircuitState::Closed => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                if state.consecutive_failures >= self.config.failure_threshold {
                    let failures = state.consecutive_failures;
                    state.transition(CircuitState::Open, now);
                    warn!(
                        breaker = %self.name,
                        failures,
                        recovery_timeout = ?self.config.recovery_timeout,
                        "Circuit breaker opened after consecutive failures"
                    );
                }
            }
            CircuitState::HalfOpen => {
                state.transition(CircuitState::Open, now);
                warn!(breaker = %self.name, "Circuit breaker reopened after failed probe");
            }
            CircuitState::Open => {}
        }
    }

    /// Give a permit back without counting an outcome
    ///
    /// Used for calls the caller cancelled; a released probe frees its slot.
    pub fn release(&self, mut permit: CallPermit) {
        permit.give_back();
    }

    /// Run a synchronous operation under breaker protection
    pub fn call<F, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let permit = self.try_acquire()?;
        match operation() {
            Ok(value) => {
                self.record_success(permit);
                Ok(value)
            }
            Err(source) => {
                self.record_failure(permit);
                Err(BreakerError::OperationFailed { source })
            }
        }
    }

    /// Run an async operation under breaker protection
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let permit = self.try_acquire()?;
        match operation().await {
            Ok(value) => {
                self.record_success(permit);
                Ok(value)
            }
            Err(source) => {
                self.record_failure(permit);
                Err(BreakerError::OperationFailed { source })
            }
        }
    }

    /// Whether `permit` was issued under the breaker's current state
    ///
    /// Any transition since admission (opened, half-open, or closed again)
    /// makes the permit stale; a stale holder must not keep calling the
    /// dependency on it.
    pub fn is_current(&self, permit: &CallPermit) -> bool {
        let state = self.shared.lock();
        state.epoch == permit.epoch && state.state != CircuitState::Open
    }

    /// Current state, without triggering the Open → HalfOpen transition
    pub fn state(&self) -> CircuitState {
        self.shared.lock().state
    }

    /// Whether the breaker is currently refusing calls
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.lock().consecutive_failures
    }

    /// Snapshot of the breaker state and counters
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let state = self.shared.lock();
        CircuitBreakerMetrics {
            state: state.state,
            consecutive_failures: state.consecutive_failures,
            half_open_calls: state.half_open_calls,
            total_calls: state.total_calls,
            rejected_calls: state.rejected_calls,
            last_transition_at: state.last_transition_at,
        }
    }

    /// Force the breaker back to Closed
    pub fn reset(&self) {
        let now = self.clock.now();
        self.shared.lock().transition(CircuitState::Closed, now);
        info!(breaker = %self.name, "Circuit breaker manually reset to closed state");
    }
}
