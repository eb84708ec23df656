//! End-to-end enqueue behavior over a database file

use castq_common::db::init_database;
use castq_common::{EffectiveEnqueueLocation, EnqueueLocation, EnqueuePositionCalculator};
use castq_qs::db;
use castq_qs::{EnqueueService, PreferencesStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

const X: i64 = 100;
const Y: i64 = 101;
const Z: i64 = 102;

struct Fixture {
    pool: SqlitePool,
    preferences: Arc<PreferencesStore>,
    service: Arc<EnqueueService>,
    _dir: TempDir,
}

async fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("castq.db"), EffectiveEnqueueLocation::Back)
        .await
        .unwrap();
    let preferences = Arc::new(PreferencesStore::new(pool.clone()));
    let service = Arc::new(EnqueueService::new(pool.clone(), preferences.clone()));

    // Feed 1 has X and Y queued; feed 2 is the one under test
    preferences.create_for_feed(1).await.unwrap();
    preferences.create_for_feed(2).await.unwrap();
    service.enqueue(1, X).await.unwrap();
    service.enqueue(1, Y).await.unwrap();

    Fixture {
        pool,
        preferences,
        service,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_front_feed_goes_before_everything() {
    let f = setup().await;
    f.preferences
        .set_enqueue_location(2, Some(EnqueueLocation::Front))
        .await
        .unwrap();

    let outcome = f.service.enqueue(2, Z).await.unwrap();

    assert_eq!(outcome.position, 0);
    assert_eq!(db::get_queue_item_ids(&f.pool).await.unwrap(), vec![Z, X, Y]);
}

#[tokio::test]
async fn test_global_feed_follows_default_back() {
    let f = setup().await;

    let outcome = f.service.enqueue(2, Z).await.unwrap();

    assert_eq!(outcome.strategy, EffectiveEnqueueLocation::Back);
    assert_eq!(db::get_queue_item_ids(&f.pool).await.unwrap(), vec![X, Y, Z]);
}

#[tokio::test]
async fn test_after_currently_playing() {
    let f = setup().await;
    f.preferences
        .set_enqueue_location(2, Some(EnqueueLocation::AfterCurrentlyPlaying))
        .await
        .unwrap();

    f.service.set_currently_playing(Some(X)).await.unwrap();
    f.service.enqueue(2, Z).await.unwrap();
    assert_eq!(db::get_queue_item_ids(&f.pool).await.unwrap(), vec![X, Z, Y]);
}

#[tokio::test]
async fn test_after_currently_playing_with_stale_current_item() {
    let f = setup().await;
    f.preferences
        .set_enqueue_location(2, Some(EnqueueLocation::AfterCurrentlyPlaying))
        .await
        .unwrap();

    // Playing item no longer in the queue: treated as nothing playing
    f.service.set_currently_playing(Some(999)).await.unwrap();
    let outcome = f.service.enqueue(2, Z).await.unwrap();
    assert_eq!(outcome.position, 0);

    f.service.set_currently_playing(None).await.unwrap();
    let outcome = f.service.enqueue(2, Z + 1).await.unwrap();
    assert_eq!(outcome.position, 0);
}

#[tokio::test]
async fn test_global_default_change_applies_to_next_enqueue() {
    let f = setup().await;

    f.preferences
        .set_global_enqueue_location(EffectiveEnqueueLocation::Front)
        .await
        .unwrap();
    f.service.enqueue(2, Z).await.unwrap();

    assert_eq!(db::get_queue_item_ids(&f.pool).await.unwrap(), vec![Z, X, Y]);
}

#[tokio::test]
async fn test_unknown_feed_is_not_found() {
    let f = setup().await;
    assert!(matches!(
        f.service.enqueue(404, Z).await,
        Err(castq_qs::Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_random_lands_inside_queue() {
    let f = setup().await;
    f.preferences
        .set_enqueue_location(2, Some(EnqueueLocation::Random))
        .await
        .unwrap();
    let service = EnqueueService::with_calculator(
        f.pool.clone(),
        f.preferences.clone(),
        EnqueuePositionCalculator::with_rng(StdRng::seed_from_u64(42)),
    );

    let outcome = service.enqueue(2, Z).await.unwrap();

    assert!(outcome.position <= 2);
    let queue = db::get_queue_item_ids(&f.pool).await.unwrap();
    assert_eq!(queue.len(), 3);
    assert_eq!(queue[outcome.position], Z);
}

#[tokio::test]
async fn test_concurrent_enqueues_all_land() {
    let f = setup().await;
    f.preferences
        .set_enqueue_location(2, Some(EnqueueLocation::Front))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for item_id in 200..220 {
        let service = f.service.clone();
        handles.push(tokio::spawn(async move { service.enqueue(2, item_id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let queue = db::get_queue_item_ids(&f.pool).await.unwrap();
    assert_eq!(queue.len(), 22);
    assert_eq!(&queue[20..], &[X, Y]);
}
