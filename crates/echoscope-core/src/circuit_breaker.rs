use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::data_source::SourceError;
use crate::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open a closed circuit.
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before admitting one trial call.
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Circuit {
    Closed { failures: u32 },
    Open { since: Instant, failures: u32 },
    HalfOpen { failures: u32 },
}

impl Circuit {
    const fn state(self) -> CircuitState {
        match self {
            Self::Closed { .. } => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    const fn failures(self) -> u32 {
        match self {
            Self::Closed { failures }
            | Self::Open { failures, .. }
            | Self::HalfOpen { failures } => failures,
        }
    }
}

/// Per-provider breaker shared by every call one adapter makes. A failed
/// half-open trial call reopens the circuit immediately.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: ProviderId,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    pub fn new(provider: ProviderId, config: CircuitBreakerConfig) -> Self {
        Self {
            provider,
            config,
            circuit: Mutex::new(Circuit::Closed { failures: 0 }),
        }
    }

    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(provider, CircuitBreakerConfig::default())
    }

    fn circuit(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits a call, or rejects it as `Unavailable` while the circuit is open.
    pub fn check(&self) -> Result<(), SourceError> {
        let mut circuit = self.circuit();
        let current = *circuit;
        match current {
            Circuit::Open { since, failures } => {
                if since.elapsed() < self.config.open_timeout {
                    return Err(SourceError::unavailable(format!(
                        "{} circuit breaker is open; skipping upstream call",
                        self.provider
                    )));
                }
                tracing::debug!(provider = %self.provider, "circuit breaker probing");
                *circuit = Circuit::HalfOpen { failures };
                Ok(())
            }
            Circuit::Closed { .. } | Circuit::HalfOpen { .. } => Ok(()),
        }
    }

    pub fn record_success(&self) {
        *self.circuit() = Circuit::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut circuit = self.circuit();
        let failures = circuit.failures().saturating_add(1);
        let trips = match *circuit {
            Circuit::Closed { .. } => failures >= self.config.failure_threshold,
            Circuit::HalfOpen { .. } | Circuit::Open { .. } => true,
        };

        *circuit = if trips {
            if circuit.state() != CircuitState::Open {
                tracing::warn!(provider = %self.provider, failures, "circuit breaker opened");
            }
            Circuit::Open {
                since: Instant::now(),
                failures,
            }
        } else {
            Circuit::Closed { failures }
        };
    }

    pub fn state(&self) -> CircuitState {
        self.circuit().state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.circuit().failures()
    }
}
