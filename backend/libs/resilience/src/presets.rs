/// Preset configurations for the gateway's two external collaborators.
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a collaborator. No retry field: neither
/// collaborator is safe to retry at this layer (see the functions below) —
/// a client-side retry is the Processor's job where it's appropriate at all.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Coordinator (Redis) calls.
///
/// - Timeout: caller-supplied (default 500ms — claim/release must be fast
///   or the instance falls back to `Unavailable`)
/// - Circuit breaker: 5 failures, 15s cooldown
pub fn coordinator_config(timeout: Duration) -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig { duration: timeout },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(15),
            error_rate_threshold: 0.5,
            window_size: 50,
        },
    }
}

/// Store (PostgreSQL) calls.
///
/// - Timeout: caller-supplied (default 2s — inserts should be fast; a
///   pool-exhaustion stall becomes `Transient` rather than an unbounded
///   wait)
/// - Circuit breaker: 10 failures, 30s cooldown (more tolerant — a single
///   slow query shouldn't trip the breaker)
pub fn store_config(timeout: Duration) -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig { duration: timeout },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 10,
            success_threshold: 3,
            timeout: Duration::from_secs(30),
            error_rate_threshold: 0.6,
            window_size: 100,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_config() {
        let config = coordinator_config(Duration::from_millis(500));
        assert_eq!(config.timeout.duration, Duration::from_millis(500));
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
    }

    #[test]
    fn test_store_config() {
        let config = store_config(Duration::from_secs(2));
        assert_eq!(config.timeout.duration, Duration::from_secs(2));
        assert_eq!(config.circuit_breaker.failure_threshold, 10);
    }
}
