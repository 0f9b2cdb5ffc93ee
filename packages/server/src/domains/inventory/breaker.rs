//! Circuit breaker for the inventory service call path.
//!
//! Explicit three-state machine, owned by one client instance:
//!
//! ```text
//! closed --(threshold consecutive failures)--> open
//! open --(cool-down elapsed, next call)--> half-open
//! half-open --(trial succeeds)--> closed, counter reset
//! half-open --(trial fails)--> open, cool-down restarted
//! ```
//!
//! State lives behind a single async mutex; every read and write goes through
//! it so the failure counter and transitions stay consistent under concurrent
//! callers. Timestamps use `tokio::time::Instant` so tests can drive the
//! clock.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum Inner {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            inner: Mutex::new(Inner::Closed { failures: 0 }),
        }
    }

    /// Decide whether a call may pass through.
    ///
    /// Returns false when the call must short-circuit to the fallback. An
    /// open circuit whose cool-down has elapsed moves to half-open and admits
    /// this caller as the single trial; while the trial is in flight every
    /// other caller is short-circuited.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match *inner {
            Inner::Closed { .. } => true,
            Inner::Open { since } => {
                if since.elapsed() >= self.cooldown {
                    info!("Circuit cool-down elapsed, moving to half-open");
                    *inner = Inner::HalfOpen;
                    true
                } else {
                    false
                }
            }
            Inner::HalfOpen => false,
        }
    }

    /// Record a successful attempt.
    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match *inner {
            Inner::HalfOpen => {
                info!("Trial call succeeded, closing circuit");
                *inner = Inner::Closed { failures: 0 };
            }
            Inner::Closed { ref mut failures } => *failures = 0,
            // Late result from an attempt that raced a transition; the open
            // state keeps its cool-down.
            Inner::Open { .. } => {}
        }
    }

    /// Record a failed attempt (including timeouts).
    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match *inner {
            Inner::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.failure_threshold {
                    warn!(failures, "Failure threshold reached, opening circuit");
                    *inner = Inner::Open {
                        since: Instant::now(),
                    };
                } else {
                    *inner = Inner::Closed { failures };
                }
            }
            Inner::HalfOpen => {
                warn!("Trial call failed, reopening circuit");
                *inner = Inner::Open {
                    since: Instant::now(),
                };
            }
            Inner::Open { .. } => {}
        }
    }

    /// Current state, without transitioning.
    pub async fn state(&self) -> CircuitState {
        match *self.inner.lock().await {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen => CircuitState::HalfOpen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_consecutive_failures() {
        let breaker = breaker();

        for _ in 0..2 {
            assert!(breaker.try_acquire().await);
            breaker.record_failure().await;
        }
        assert_eq!(breaker.state().await, CircuitState::Closed);

        assert!(breaker.try_acquire().await);
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(!breaker.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_consecutive_failure_count() {
        let breaker = breaker();

        breaker.record_failure().await;
        breaker.record_failure().await;
        breaker.record_success().await;
        breaker.record_failure().await;
        breaker.record_failure().await;

        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_admits_exactly_one_trial() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure().await;
        }

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(breaker.try_acquire().await);
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        // A second caller during the trial is short-circuited.
        assert!(!breaker.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn trial_success_closes_and_resets() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure().await;
        }
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(breaker.try_acquire().await);

        breaker.record_success().await;

        assert_eq!(breaker.state().await, CircuitState::Closed);
        // Counter was reset: two failures are not enough to reopen.
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn trial_failure_reopens_and_restarts_cooldown() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure().await;
        }
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(breaker.try_acquire().await);

        breaker.record_failure().await;

        assert_eq!(breaker.state().await, CircuitState::Open);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!breaker.try_acquire().await);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(breaker.try_acquire().await);
    }
}
