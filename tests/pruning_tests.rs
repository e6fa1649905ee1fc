use chrono::{DateTime, Duration, Utc};
use s3_version_pruner::{
    adapters::outbound::storage::StoreOperation, create_in_memory_app, BucketName, BucketTarget,
    InMemoryBucketStore, PruneRequest, PruningService, PruningServiceImpl, RetentionPolicy,
    StorageError, VersioningStatus,
};
use std::sync::Arc;

fn bucket(name: &str) -> BucketName {
    BucketName::new(name.to_string()).unwrap()
}

fn hours_ago(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    now - Duration::hours(hours)
}

/// Three buckets: one versioned, one never versioned, one the versioning
/// probe cannot reach. Listing pages hold three entries.
async fn setup_buckets_and_objects() -> InMemoryBucketStore {
    setup_with_page_size(3).await
}

async fn setup_with_page_size(page_size: usize) -> InMemoryBucketStore {
    let store = InMemoryBucketStore::with_page_size(page_size);
    let now = Utc::now();

    let b1 = bucket("b1-bucket");
    store.create_bucket(&b1, VersioningStatus::Enabled).await;
    store
        .add_version(&b1, "key1", "b1-key1-v1", hours_ago(now, 10), 1_000)
        .await
        .unwrap();
    store
        .add_version(&b1, "key1", "b1-key1-v2", hours_ago(now, 9), 2_000)
        .await
        .unwrap();
    store
        .add_delete_marker(&b1, "key1", "b1-key1-v2-deleted", hours_ago(now, 8))
        .await
        .unwrap();
    store
        .add_version(&b1, "key1", "b1-key1-v3", hours_ago(now, 7), 3_000)
        .await
        .unwrap();
    store
        .add_delete_marker(&b1, "key2", "b1-key2-deleted", hours_ago(now, 11))
        .await
        .unwrap();
    store
        .add_version(&b1, "key2", "b1-key2-v1", hours_ago(now, 10), 4_000)
        .await
        .unwrap();
    store
        .add_version(&b1, "key2", "b1-key2-v2", hours_ago(now, 9), 5_000)
        .await
        .unwrap();

    let b2 = bucket("b2-bucket");
    store.create_bucket(&b2, VersioningStatus::Unset).await;
    store
        .add_version(&b2, "key1", "b2-key1-v1", hours_ago(now, 10), 1_000)
        .await
        .unwrap();
    store
        .add_version(&b2, "key1", "b2-key1-v2", hours_ago(now, 9), 1_000)
        .await
        .unwrap();
    store
        .add_version(&b2, "key2", "b2-key2-v1", hours_ago(now, 10), 1_000)
        .await
        .unwrap();

    let b3 = bucket("bucket-in-wrong-region");
    store.create_bucket(&b3, VersioningStatus::Enabled).await;
    store
        .add_version(&b3, "key1", "b3-key1-v1", hours_ago(now, 10), 1_000)
        .await
        .unwrap();
    store
        .add_version(&b3, "key1", "b3-key1-v2", hours_ago(now, 9), 1_000)
        .await
        .unwrap();
    store.place_in_other_region(&b3).await.unwrap();

    store
}

fn request(confirm: bool) -> PruneRequest {
    let request = PruneRequest::dry_run(BucketTarget::All, RetentionPolicy::keep_latest(1));
    if confirm {
        request.confirmed()
    } else {
        request
    }
}

#[tokio::test]
async fn test_find_and_delete() {
    let store = setup_buckets_and_objects().await;
    let app = create_in_memory_app(store.clone(), request(true))
        .await
        .unwrap();

    let report = app.run().await.unwrap();

    assert_eq!(store.remaining_versions(&bucket("b1-bucket"), "key1").await.len(), 1);
    assert_eq!(store.remaining_versions(&bucket("b1-bucket"), "key2").await.len(), 1);
    assert_eq!(store.remaining_versions(&bucket("b2-bucket"), "key1").await.len(), 2);
    assert_eq!(
        store
            .remaining_versions(&bucket("bucket-in-wrong-region"), "key1")
            .await
            .len(),
        2
    );

    let survivors: Vec<String> = [
        store.remaining_versions(&bucket("b1-bucket"), "key1").await,
        store.remaining_versions(&bucket("b1-bucket"), "key2").await,
    ]
    .concat()
    .into_iter()
    .map(|r| r.version_id.to_string())
    .collect();
    assert_eq!(survivors, vec!["b1-key1-v3", "b1-key2-v2"]);

    assert_eq!(report.buckets.len(), 1);
    let b1 = &report.buckets[0];
    assert_eq!(b1.pages, 3);
    assert_eq!(b1.keys_scanned, 2);
    assert_eq!(b1.records_scanned, 7);
    assert_eq!(b1.versions_to_delete, 5);
    assert_eq!(b1.reclaimable_bytes, 1_000 + 2_000 + 4_000);
    assert_eq!(report.versions_deleted(), 5);
    assert_eq!(store.delete_calls().await, vec![5]);
}

#[tokio::test]
async fn test_skip_delete() {
    let store = setup_buckets_and_objects().await;
    let app = create_in_memory_app(store.clone(), request(false))
        .await
        .unwrap();

    let report = app.run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.versions_to_delete(), 5);
    assert_eq!(report.versions_deleted(), 0);
    assert!(store.delete_calls().await.is_empty());
    assert_eq!(store.remaining_versions(&bucket("b1-bucket"), "key1").await.len(), 4);
    assert_eq!(store.remaining_versions(&bucket("b1-bucket"), "key2").await.len(), 3);
    assert_eq!(store.remaining_versions(&bucket("b2-bucket"), "key1").await.len(), 2);
}

#[tokio::test]
async fn test_second_run_finds_nothing_left() {
    let store = setup_buckets_and_objects().await;
    let service = PruningServiceImpl::new(Arc::new(store.clone()));

    service.run(&request(true)).await.unwrap();
    let report = service.run(&request(true)).await.unwrap();

    assert_eq!(report.versions_to_delete(), 0);
    assert_eq!(store.delete_calls().await.len(), 1);
}

#[tokio::test]
async fn test_single_bucket_target() {
    let store = setup_buckets_and_objects().await;
    let service = PruningServiceImpl::new(Arc::new(store.clone()));
    let request = PruneRequest::dry_run(
        BucketTarget::Named(bucket("b1-bucket")),
        RetentionPolicy::keep_latest(1),
    );

    let report = service.run(&request).await.unwrap();

    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.buckets[0].bucket, bucket("b1-bucket"));
}

#[tokio::test]
async fn test_named_unversioned_bucket_is_skipped() {
    let store = setup_buckets_and_objects().await;
    let service = PruningServiceImpl::new(Arc::new(store.clone()));
    let request = PruneRequest::dry_run(
        BucketTarget::Named(bucket("b2-bucket")),
        RetentionPolicy::keep_latest(1),
    )
    .confirmed();

    let report = service.run(&request).await.unwrap();

    assert!(report.buckets.is_empty());
    assert!(store.delete_calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_bucket() {
    let store = setup_buckets_and_objects().await;
    let service = PruningServiceImpl::new(Arc::new(store));
    let request = PruneRequest::dry_run(
        BucketTarget::Named(bucket("missing-bucket")),
        RetentionPolicy::keep_latest(1),
    );

    let err = service.run(&request).await.unwrap_err();

    assert!(err.to_string().contains("Bucket doesn't exist"));
}

#[tokio::test]
async fn test_delete_failure_stops_the_run() {
    let store = setup_buckets_and_objects().await;
    store
        .fail_on(StoreOperation::DeleteVersions, "ServiceUnavailable")
        .await;
    let service = PruningServiceImpl::new(Arc::new(store.clone()));

    let err = service.run(&request(true)).await.unwrap_err();

    assert_eq!(
        err,
        StorageError::remote("DeleteObjects", "ServiceUnavailable")
    );
    assert_eq!(store.remaining_versions(&bucket("b1-bucket"), "key1").await.len(), 4);
}

#[tokio::test]
async fn test_large_history_is_deleted_in_batches() {
    let store = InMemoryBucketStore::new();
    let b1 = bucket("big-bucket");
    store.create_bucket(&b1, VersioningStatus::Enabled).await;

    let now = Utc::now();
    for v in 0..2_501 {
        store
            .add_version(&b1, "hot-key", &format!("v{v:05}"), now - Duration::seconds(v), 10)
            .await
            .unwrap();
    }

    let service = PruningServiceImpl::new(Arc::new(store.clone()));
    let report = service.run(&request(true)).await.unwrap();

    assert_eq!(store.delete_calls().await, vec![1_000, 1_000, 500]);
    assert_eq!(report.versions_deleted(), 2_500);
    let remaining = store.remaining_versions(&b1, "hot-key").await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].version_id.as_str(), "v00000");
}

#[tokio::test]
async fn test_small_pages_give_the_same_plan() {
    let service = PruningServiceImpl::new(Arc::new(setup_buckets_and_objects().await));
    let small = service.run(&request(false)).await.unwrap();

    let service = PruningServiceImpl::new(Arc::new(setup_with_page_size(1_000).await));
    let large = service.run(&request(false)).await.unwrap();

    assert_eq!(small.buckets[0].pages, 3);
    assert_eq!(large.buckets[0].pages, 1);
    assert_eq!(small.versions_to_delete(), large.versions_to_delete());
    assert_eq!(small.reclaimable_bytes(), large.reclaimable_bytes());
}
