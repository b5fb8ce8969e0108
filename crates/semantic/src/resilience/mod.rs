//! Retry and circuit breaking for the HTTP encoder.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{execute_with_retry_async, is_retryable_error, RetryConfig, RetryResult};
