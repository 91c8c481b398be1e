//! Resilience patterns for the cognitive audit.
//!
//! - Circuit breaker to stop calling a failing provider
//! - Token budget to cap spend

mod budget;
mod circuit_breaker;

pub use budget::{AuditBudget, LlmUsage, TokenBudget};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
