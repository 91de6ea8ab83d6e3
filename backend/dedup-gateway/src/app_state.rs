//! Shared process-wide dependencies, handed to every WebSocket session actor.

use std::sync::Arc;

use dedup_coordinator::RedisCoordinator;
use dedup_processor::DedupProcessor;
use dedup_store::PgStore;
use instance_identity::InstanceId;

pub type Processor = DedupProcessor<RedisCoordinator, PgStore>;

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<Processor>,
    pub instance_id: InstanceId,
}
