//! The Dedup Processor: the protocol core.
//!
//! Given one validated `EventRecord`, claims single-flight ownership in the
//! Coordinator, persists through the Store, and releases the claim only on
//! failure. Generic over both collaborators so tests run against in-memory
//! fakes instead of live Redis/Postgres.

use dedup_coordinator::{ClaimOutcome, CoordinatorClient, ReleaseOutcome};
use dedup_store::{EventRecord, InsertOutcome, StoreClient};
use instance_identity::InstanceId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The outcome handed back to the Session Loop. Every branch of the state
/// machine in `spec.md` §4.D terminates in exactly one of these; the
/// Processor never raises an exception for an expected path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Persisted,
    DuplicateSkipped,
    RetryableFailure,
    FatalFailure,
}

pub struct DedupProcessor<C, S> {
    coordinator: Arc<C>,
    store: Arc<S>,
    instance_id: InstanceId,
    claim_ttl: Duration,
}

impl<C, S> DedupProcessor<C, S>
where
    C: CoordinatorClient,
    S: StoreClient,
{
    pub fn new(coordinator: Arc<C>, store: Arc<S>, instance_id: InstanceId, claim_ttl: Duration) -> Self {
        Self {
            coordinator,
            store,
            instance_id,
            claim_ttl,
        }
    }

    pub async fn process(&self, record: &EventRecord) -> ProcessOutcome {
        match self
            .coordinator
            .claim(&record.event_id, &self.instance_id, self.claim_ttl)
            .await
        {
            ClaimOutcome::Lost => {
                info!(event_id = %record.event_id, "duplicate skipped: claim already held");
                ProcessOutcome::DuplicateSkipped
            }
            ClaimOutcome::Unavailable => {
                warn!(event_id = %record.event_id, "coordinator unavailable, cannot establish single-flight");
                ProcessOutcome::RetryableFailure
            }
            ClaimOutcome::Won => self.persist(record).await,
        }
    }

    async fn persist(&self, record: &EventRecord) -> ProcessOutcome {
        match self.store.insert(record).await {
            InsertOutcome::Inserted => {
                info!(event_id = %record.event_id, instance_id = %self.instance_id, "persisted");
                ProcessOutcome::Persisted
            }
            InsertOutcome::Duplicate => {
                info!(event_id = %record.event_id, "store reports duplicate, claim already redundant");
                ProcessOutcome::Persisted
            }
            InsertOutcome::Transient => {
                self.release(record).await;
                ProcessOutcome::RetryableFailure
            }
            InsertOutcome::Fatal => {
                tracing::error!(event_id = %record.event_id, "fatal store failure, event lost");
                self.release(record).await;
                ProcessOutcome::FatalFailure
            }
        }
    }

    async fn release(&self, record: &EventRecord) {
        match self.coordinator.release(&record.event_id, &self.instance_id).await {
            ReleaseOutcome::Released => {}
            ReleaseOutcome::NotOwner => {
                warn!(event_id = %record.event_id, "release found a different owner, leaving claim alone");
            }
            ReleaseOutcome::Unavailable => {
                warn!(event_id = %record.event_id, "coordinator unavailable during release, claim will expire by TTL");
            }
        }
    }
}
