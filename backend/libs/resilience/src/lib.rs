//! Resilience patterns for the dedup gateway's two external collaborators.
//!
//! - **Timeout**: enforces a deadline on every Coordinator/Store round trip.
//! - **Circuit Breaker**: fails fast once a collaborator's error rate makes
//!   further attempts pointless.
//! - **Presets**: pre-tuned settings for the coordinator and store calls.
//!
//! # Example: Store call with timeout
//!
//! ```rust,no_run
//! use resilience::{presets, timeout::with_timeout};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = presets::store_config(Duration::from_secs(2));
//!
//!     let result = with_timeout(config.timeout.duration, async {
//!         // insert into the store here
//!         Ok::<_, String>(())
//!     })
//!     .await;
//! }
//! ```

pub mod circuit_breaker;
pub mod presets;
pub mod timeout;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use presets::{coordinator_config, store_config, ServiceConfig};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
