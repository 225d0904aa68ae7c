//! Resilience patterns for attune-runtime.
//!
//! This module provides:
//! - Circuit breaker per external source to prevent cascade failures
//! - Per-run fallback-research budget
//!
//! There is deliberately no retry/backoff here: a single external-call
//! failure degrades to "unknown" and the run continues.

mod budget;
mod circuit_breaker;

pub use budget::ResearchBudget;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, SourceKind};
