//! Circuit breaker around the cognitive audit.
//!
//! When LLM calls fail repeatedly the circuit opens and the guard stops
//! calling out, flagging messages for human review until the recovery
//! timeout passes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures before opening the circuit
    pub failure_threshold: u32,

    /// Time before a trial call is allowed
    #[serde(with = "crate::config::human_duration")]
    pub recovery_timeout: Duration,

    /// Trial successes needed to close the circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of the circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// All calls bypass the LLM
    Open { opened_at: Instant },

    /// Trial calls allowed
    HalfOpen { successes: u32 },
}

pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed { failures: 0 }),
            config,
        }
    }

    /// True if calls should skip the LLM.
    ///
    /// An open circuit whose recovery timeout has passed moves to half-open
    /// and lets the call through.
    pub fn is_open(&self) -> bool {
        let state = self.state.read();
        match *state {
            CircuitState::Open { opened_at } => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(state);
                    self.transition_to_half_open();
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write();
        match *state {
            CircuitState::HalfOpen { successes } => {
                if successes + 1 >= self.config.success_threshold {
                    *state = CircuitState::Closed { failures: 0 };
                    tracing::info!("Audit circuit closed after successful recovery");
                } else {
                    *state = CircuitState::HalfOpen {
                        successes: successes + 1,
                    };
                }
            }
            CircuitState::Closed { .. } => {
                *state = CircuitState::Closed { failures: 0 };
            }
            CircuitState::Open { .. } => {}
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.write();
        match *state {
            CircuitState::Closed { failures } => {
                if failures + 1 >= self.config.failure_threshold {
                    *state = CircuitState::Open {
                        opened_at: Instant::now(),
                    };
                    tracing::warn!(
                        failures = failures + 1,
                        "Audit circuit opened after repeated failures"
                    );
                } else {
                    *state = CircuitState::Closed {
                        failures: failures + 1,
                    };
                }
            }
            CircuitState::HalfOpen { .. } => {
                *state = CircuitState::Open {
                    opened_at: Instant::now(),
                };
                tracing::warn!("Audit circuit reopened after failed recovery attempt");
            }
            CircuitState::Open { .. } => {}
        }
    }

    fn transition_to_half_open(&self) {
        let mut state = self.state.write();
        if matches!(*state, CircuitState::Open { .. }) {
            *state = CircuitState::HalfOpen { successes: 0 };
            tracing::info!("Audit circuit half-open for recovery test");
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.read().clone()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, recovery_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout,
            success_threshold: 1,
        })
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open());
        assert_eq!(cb.state(), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_circuit_opens_after_failures() {
        let cb = breaker(2, Duration::from_secs(60));

        cb.record_failure();
        assert!(!cb.is_open());

        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::default();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();

        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
    }

    #[test]
    fn test_half_open_after_recovery_timeout() {
        let cb = breaker(1, Duration::ZERO);
        cb.record_failure();

        assert!(!cb.is_open());
        assert_eq!(cb.state(), CircuitState::HalfOpen { successes: 0 });

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_failed_trial_reopens() {
        let cb = breaker(1, Duration::ZERO);
        cb.record_failure();
        assert!(!cb.is_open());

        cb.record_failure();
        assert!(matches!(cb.state(), CircuitState::Open { .. }));
    }
}
