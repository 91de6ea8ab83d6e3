//! PostgreSQL-backed Store Client: the authoritative uniqueness oracle.
//!
//! Grounded in the teacher's `db-pool` (pool construction, metrics) and
//! `resilience::with_timeout`. A `Duplicate` verdict here overrides
//! whatever the Coordinator said about the same event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db_pool::BackpressureConfig;
use resilience::CircuitBreaker;
use serde_json::Value;
use sqlx::PgPool;
use std::time::Duration;
use tracing::error;

/// The canonical in-memory representation of one submitted event.
///
/// Decoding and validation of the wire frame into this type is the
/// gateway's job (`dedup-gateway::event`); this crate only ever sees
/// records that already passed that check.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
    Transient,
    Fatal,
}

#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn insert(&self, record: &EventRecord) -> InsertOutcome;
}

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore {
    pool: PgPool,
    call_timeout: Duration,
    backpressure: BackpressureConfig,
    breaker: CircuitBreaker,
}

impl PgStore {
    pub fn new(pool: PgPool, call_timeout: Duration) -> Self {
        let breaker = CircuitBreaker::new(resilience::presets::store_config(call_timeout).circuit_breaker);
        Self {
            pool,
            call_timeout,
            backpressure: BackpressureConfig::from_env(),
            breaker,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreClient for PgStore {
    async fn insert(&self, record: &EventRecord) -> InsertOutcome {
        if self.breaker.should_reject() {
            error!(event_id = %record.event_id, "store circuit open, skipping insert");
            return InsertOutcome::Transient;
        }

        let mut conn = match db_pool::acquire_with_backpressure(&self.pool, "dedup-store", self.backpressure)
            .await
        {
            Ok(conn) => conn,
            Err(err) => {
                error!(event_id = %record.event_id, error = %err, "store pool exhausted");
                return InsertOutcome::Transient;
            }
        };

        let query = sqlx::query(
            "INSERT INTO events (event_id, event_type, payload) VALUES ($1, $2, $3)",
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(&record.payload)
        .execute(&mut *conn);

        let outcome = resilience::with_timeout(self.call_timeout, query).await;

        let classified = match outcome {
            Ok(Ok(_)) => InsertOutcome::Inserted,
            Ok(Err(sqlx::Error::Database(db_err))) => {
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    InsertOutcome::Duplicate
                } else {
                    error!(event_id = %record.event_id, error = %db_err, "store fatal error");
                    InsertOutcome::Fatal
                }
            }
            Ok(Err(sqlx::Error::PoolTimedOut)) | Ok(Err(sqlx::Error::Io(_))) => {
                InsertOutcome::Transient
            }
            Ok(Err(err)) => {
                error!(event_id = %record.event_id, error = %err, "store fatal error");
                InsertOutcome::Fatal
            }
            Err(_elapsed) => InsertOutcome::Transient,
        };

        // A unique-key collision means Postgres is healthy and correctly doing its
        // job; only genuine transport/backend trouble should move the breaker.
        match classified {
            InsertOutcome::Inserted | InsertOutcome::Duplicate => self.breaker.record_success(),
            InsertOutcome::Transient | InsertOutcome::Fatal => self.breaker.record_failure(),
        }

        classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_code_matches_postgres() {
        assert_eq!(UNIQUE_VIOLATION, "23505");
    }
}
