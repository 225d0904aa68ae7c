//! Circuit breaker to prevent cascade failures.
//!
//! When calls to an external source fail repeatedly, that source's circuit
//! opens and subsequent calls are skipped immediately; the caller treats
//! the value as unknown instead of waiting on a dead service.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// External source kinds with independent circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The primary structured-metadata source.
    Features,
    /// The fallback researcher's text search tool.
    Search,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery (in seconds)
    #[serde(with = "duration_secs")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
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

/// State of a circuit.
#[derive(Debug, Clone)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Circuit is open, all calls are skipped
    Open { opened_at: Instant },

    /// Testing if circuit can close
    HalfOpen { successes: u32 },
}

/// Circuit breaker over external sources.
///
/// Each source kind has its own circuit to allow independent recovery.
pub struct CircuitBreaker {
    states: RwLock<HashMap<SourceKind, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Check if circuit is open for a source.
    ///
    /// Returns true if calls should be skipped and the value treated as
    /// unknown.
    pub fn is_open(&self, source: SourceKind) -> bool {
        let states = self.states.read();
        match states.get(&source) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(source);
                    false
                } else {
                    true
                }
            }
            Some(CircuitState::HalfOpen { .. }) => false, // Allow test calls
            _ => false,
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, source: SourceKind) {
        let mut states = self.states.write();
        match states.get(&source).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(source, CircuitState::Closed { failures: 0 });
                    tracing::info!(source = ?source, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        source,
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(source, CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self, source: SourceKind) {
        let mut states = self.states.write();
        match states.get(&source).cloned() {
            Some(CircuitState::Closed { failures }) => {
                if failures + 1 >= self.config.failure_threshold {
                    states.insert(
                        source,
                        CircuitState::Open {
                            opened_at: Instant::now(),
                        },
                    );
                    tracing::warn!(
                        source = ?source,
                        failures = failures + 1,
                        "Circuit opened after repeated failures"
                    );
                } else {
                    states.insert(
                        source,
                        CircuitState::Closed {
                            failures: failures + 1,
                        },
                    );
                }
            }
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    source,
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(source = ?source, "Circuit reopened after failed recovery attempt");
            }
            None => {
                states.insert(source, CircuitState::Closed { failures: 1 });
            }
            _ => {}
        }
    }

    /// Transition circuit to half-open state.
    fn transition_to_half_open(&self, source: SourceKind) {
        let mut states = self.states.write();
        if matches!(states.get(&source), Some(CircuitState::Open { .. })) {
            states.insert(source, CircuitState::HalfOpen { successes: 0 });
            tracing::info!(source = ?source, "Circuit transitioning to half-open for recovery test");
        }
    }

    /// Get current state of a circuit.
    pub fn state(&self, source: SourceKind) -> CircuitState {
        self.states
            .read()
            .get(&source)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
