//! Circuit breaker for external API calls.
//!
//! Stops hammering an upstream that keeps failing: after enough consecutive
//! failures the breaker opens and callers fail fast until a recovery window
//! has passed, then a few trial calls decide whether to close it again.

use log::{info, warn};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// States for the API circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCircuitState {
    /// Normal operation - requests are allowed
    Closed,
    /// Circuit is open - requests are blocked
    Open,
    /// Testing if service is recovered
    HalfOpen,
}

/// Configuration for API circuit breaker
#[derive(Debug, Clone)]
pub struct ApiCircuitBreakerConfig {
    /// Number of consecutive failures to trip the circuit
    pub failure_threshold: u32,
    /// Duration to wait before attempting recovery
    pub recovery_timeout: Duration,
    /// Number of successful calls in half-open state to close circuit
    pub success_threshold: u32,
}

impl Default for ApiCircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: ApiCircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

/// Lightweight circuit breaker shared by the HTTP clients.
///
/// ```ignore
/// if !breaker.is_available() {
///     return Err(QueryError::CircuitOpen { api: breaker.name().to_string() });
/// }
/// match call().await {
///     Ok(v) => { breaker.record_success(); Ok(v) }
///     Err(e) => { breaker.record_failure(); Err(e) }
/// }
/// ```
#[derive(Debug)]
pub struct ApiCircuitBreaker {
    name: String,
    config: ApiCircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl ApiCircuitBreaker {
    pub fn new(name: &str, config: ApiCircuitBreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            inner: Mutex::new(BreakerState {
                state: ApiCircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
            }),
        }
    }

    pub fn with_defaults(name: &str) -> Self {
        Self::new(name, ApiCircuitBreakerConfig::default())
    }

    /// Check if the circuit breaker allows requests.
    ///
    /// An open breaker whose recovery window has elapsed moves to half-open
    /// and lets the call through.
    pub fn is_available(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            ApiCircuitState::Closed | ApiCircuitState::HalfOpen => true,
            ApiCircuitState::Open => {
                let recovered = inner
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.recovery_timeout)
                    .unwrap_or(true);
                if recovered {
                    inner.state = ApiCircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                }
                recovered
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;

        if inner.state == ApiCircuitState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes < self.config.success_threshold {
                return;
            }
            info!(
                "API circuit breaker '{}' closed after {} successful calls",
                self.name, inner.half_open_successes
            );
        }
        inner.state = ApiCircuitState::Closed;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures += 1;

        match inner.state {
            ApiCircuitState::Closed if inner.consecutive_failures >= self.config.failure_threshold => {
                inner.state = ApiCircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!(
                    "API circuit breaker '{}' OPENED after {} consecutive failures",
                    self.name, inner.consecutive_failures
                );
            }
            ApiCircuitState::HalfOpen => {
                inner.state = ApiCircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!("API circuit breaker '{}' re-OPENED during half-open test", self.name);
            }
            _ => {}
        }
    }

    pub fn state(&self) -> ApiCircuitState {
        self.inner.lock().state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = ApiCircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.half_open_successes = 0;
        inner.opened_at = None;
    }
}
