use dedup_coordinator::{ClaimOutcome, CoordinatorClient, ReleaseOutcome, RedisCoordinator};
use instance_identity::InstanceId;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

async fn coordinator() -> RedisCoordinator {
    let url = std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let client = redis::Client::open(url).expect("valid redis url");
    let manager = ConnectionManager::new(client)
        .await
        .expect("connect to redis");
    RedisCoordinator::new(Arc::new(Mutex::new(manager)), Duration::from_millis(500))
}

#[tokio::test]
#[ignore = "Requires Redis"]
async fn second_claim_on_same_key_loses() {
    let coord = coordinator().await;
    let owner_a = InstanceId::generate();
    let owner_b = InstanceId::generate();
    let event_id = format!("test-claim-{}", uuid::Uuid::new_v4());

    let first = coord.claim(&event_id, &owner_a, Duration::from_secs(30)).await;
    let second = coord.claim(&event_id, &owner_b, Duration::from_secs(30)).await;

    assert_eq!(first, ClaimOutcome::Won);
    assert_eq!(second, ClaimOutcome::Lost);

    coord.release(&event_id, &owner_a).await;
}

#[tokio::test]
#[ignore = "Requires Redis"]
async fn release_by_non_owner_is_a_no_op() {
    let coord = coordinator().await;
    let owner = InstanceId::generate();
    let impostor = InstanceId::generate();
    let event_id = format!("test-release-{}", uuid::Uuid::new_v4());

    coord.claim(&event_id, &owner, Duration::from_secs(30)).await;
    let outcome = coord.release(&event_id, &impostor).await;
    assert_eq!(outcome, ReleaseOutcome::NotOwner);

    let real_release = coord.release(&event_id, &owner).await;
    assert_eq!(real_release, ReleaseOutcome::Released);
}

#[tokio::test]
#[ignore = "Requires Redis"]
async fn peek_reflects_current_owner() {
    let coord = coordinator().await;
    let owner = InstanceId::generate();
    let event_id = format!("test-peek-{}", uuid::Uuid::new_v4());

    assert_eq!(coord.peek(&event_id).await, None);

    coord.claim(&event_id, &owner, Duration::from_secs(30)).await;
    assert_eq!(coord.peek(&event_id).await, Some(owner.as_str().to_string()));

    coord.release(&event_id, &owner).await;
}
