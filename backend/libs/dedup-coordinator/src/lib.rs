//! Redis-backed Coordinator Client: fast, advisory single-flight claims.
//!
//! Grounded in the teacher's `redis-utils` connection manager and
//! `resilience::with_timeout` wrapper. `Claim` and `Release` are the two
//! calls on the happy path; `Peek` exists for diagnostics only.

use async_trait::async_trait;
use instance_identity::InstanceId;
use redis::AsyncCommands;
use redis_utils::SharedConnectionManager;
use resilience::CircuitBreaker;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Won,
    Lost,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotOwner,
    Unavailable,
}

/// What the Processor depends on. A trait, not a concrete type, so
/// `dedup-processor` can be tested against an in-memory fake.
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    async fn claim(&self, event_id: &str, owner: &InstanceId, ttl: Duration) -> ClaimOutcome;
    async fn release(&self, event_id: &str, owner: &InstanceId) -> ReleaseOutcome;
    async fn peek(&self, event_id: &str) -> Option<String>;
}

fn dedup_key(event_id: &str) -> String {
    format!("dedup:{event_id}")
}

/// Atomic compare-and-delete: only removes the key if its value still
/// matches `owner`. Resolves the "release race" by doing the GET+DEL as
/// one server-side script instead of two round trips.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisCoordinator {
    manager: SharedConnectionManager,
    call_timeout: Duration,
    release_script: redis::Script,
    breaker: CircuitBreaker,
}

impl RedisCoordinator {
    pub fn new(manager: SharedConnectionManager, call_timeout: Duration) -> Self {
        let breaker = CircuitBreaker::new(resilience::presets::coordinator_config(call_timeout).circuit_breaker);
        Self {
            manager,
            call_timeout,
            release_script: redis::Script::new(RELEASE_SCRIPT),
            breaker,
        }
    }
}

#[async_trait]
impl CoordinatorClient for RedisCoordinator {
    async fn claim(&self, event_id: &str, owner: &InstanceId, ttl: Duration) -> ClaimOutcome {
        if self.breaker.should_reject() {
            debug!(event_id, "coordinator circuit open, skipping claim");
            return ClaimOutcome::Unavailable;
        }

        let key = dedup_key(event_id);
        let owner = owner.as_str().to_string();
        let ttl_secs = ttl.as_secs().max(1);

        let result = resilience::with_timeout(self.call_timeout, async {
            let mut conn = self.manager.lock().await;
            let reply: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&owner)
                .arg("NX")
                .arg("EX")
                .arg(ttl_secs)
                .query_async(&mut *conn)
                .await?;
            Ok::<_, redis::RedisError>(reply)
        })
        .await;

        match result {
            Ok(Ok(won)) => {
                self.breaker.record_success();
                if won.is_some() {
                    ClaimOutcome::Won
                } else {
                    ClaimOutcome::Lost
                }
            }
            Ok(Err(err)) => {
                self.breaker.record_failure();
                warn!(event_id, error = %err, "coordinator claim unavailable");
                ClaimOutcome::Unavailable
            }
            Err(_elapsed) => {
                self.breaker.record_failure();
                warn!(event_id, "coordinator claim timed out");
                ClaimOutcome::Unavailable
            }
        }
    }

    async fn release(&self, event_id: &str, owner: &InstanceId) -> ReleaseOutcome {
        if self.breaker.should_reject() {
            debug!(event_id, "coordinator circuit open, skipping release");
            return ReleaseOutcome::Unavailable;
        }

        let key = dedup_key(event_id);
        let owner = owner.as_str().to_string();

        let result = resilience::with_timeout(self.call_timeout, async {
            let mut conn = self.manager.lock().await;
            let deleted: Result<i64, redis::RedisError> = self
                .release_script
                .key(&key)
                .arg(&owner)
                .invoke_async(&mut *conn)
                .await;
            deleted
        })
        .await;

        match result {
            Ok(Ok(1)) => {
                self.breaker.record_success();
                ReleaseOutcome::Released
            }
            Ok(Ok(_)) => {
                self.breaker.record_success();
                ReleaseOutcome::NotOwner
            }
            Ok(Err(err)) => {
                self.breaker.record_failure();
                warn!(event_id, error = %err, "coordinator release unavailable");
                ReleaseOutcome::Unavailable
            }
            Err(_elapsed) => {
                self.breaker.record_failure();
                warn!(event_id, "coordinator release timed out");
                ReleaseOutcome::Unavailable
            }
        }
    }

    async fn peek(&self, event_id: &str) -> Option<String> {
        let key = dedup_key(event_id);
        let result: Result<Option<String>, redis::RedisError> =
            redis_utils::with_timeout(async {
                let mut conn = self.manager.lock().await;
                conn.get(&key).await
            })
            .await;

        match result {
            Ok(v) => v,
            Err(err) => {
                debug!(event_id, error = %err, "coordinator peek failed");
                None
            }
        }
    }
}
