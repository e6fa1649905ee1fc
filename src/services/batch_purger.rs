use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::StorageResult,
        models::{PurgeOutcome, PurgeTarget},
        value_objects::BucketName,
    },
    ports::storage::{VersionedBucketStore, MAX_DELETE_BATCH_SIZE},
};

/// Deletes purge targets in sequential bulk-delete batches
#[derive(Clone)]
pub struct BatchPurger {
    store: Arc<dyn VersionedBucketStore>,
    batch_size: usize,
}

impl BatchPurger {
    pub fn new(store: Arc<dyn VersionedBucketStore>) -> Self {
        Self {
            store,
            batch_size: MAX_DELETE_BATCH_SIZE,
        }
    }

    /// Use smaller batches; values above the provider limit are clamped to it
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_DELETE_BATCH_SIZE);
        self
    }

    /// Delete every target, one batch at a time.
    ///
    /// A failed batch call stops the purge and is returned; batches already
    /// sent stay deleted. Per-item errors inside a successful batch are
    /// collected in the outcome, not returned as an error.
    pub async fn purge(
        &self,
        bucket: &BucketName,
        targets: &[PurgeTarget],
    ) -> StorageResult<PurgeOutcome> {
        let mut outcome = PurgeOutcome {
            requested: targets.len(),
            ..PurgeOutcome::default()
        };

        for chunk in targets.chunks(self.batch_size) {
            debug!(
                bucket = %bucket,
                batch = outcome.batches + 1,
                size = chunk.len(),
                "deleting batch"
            );

            let result = self.store.delete_versions(bucket, chunk).await?;
            outcome.batches += 1;
            outcome.deleted += result.deleted_count();

            info!(bucket = %bucket, "deleted {} versions", result.deleted_count());

            if result.deleted_count() != chunk.len() {
                warn!(
                    bucket = %bucket,
                    requested = chunk.len(),
                    deleted = result.deleted_count(),
                    "batch deleted fewer versions than requested"
                );
            }
            for failure in &result.failures {
                warn!(
                    bucket = %bucket,
                    key = %failure.key,
                    version_id = failure.version_id.as_deref().unwrap_or_default(),
                    code = failure.code.as_deref().unwrap_or_default(),
                    message = failure.message.as_deref().unwrap_or_default(),
                    "failed to delete version"
                );
            }
            outcome.failures.extend(result.failures);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::{InMemoryBucketStore, StoreOperation};
    use crate::domain::errors::StorageError;
    use crate::domain::models::VersioningStatus;
    use crate::domain::value_objects::{ObjectKey, VersionId};
    use chrono::Utc;

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name.to_string()).unwrap()
    }

    async fn store_with_versions(
        count: usize,
    ) -> (InMemoryBucketStore, BucketName, Vec<PurgeTarget>) {
        let store = InMemoryBucketStore::new();
        let b1 = bucket("b1-data");
        store.create_bucket(&b1, VersioningStatus::Enabled).await;

        let now = Utc::now();
        let mut targets = Vec::with_capacity(count);
        for i in 0..count {
            let key = format!("key-{}", i % 50);
            let id = format!("v{i}");
            store.add_version(&b1, &key, &id, now, 1).await.unwrap();
            targets.push(PurgeTarget {
                key: ObjectKey::new(key).unwrap(),
                version_id: VersionId::new(id).unwrap(),
            });
        }

        (store, b1, targets)
    }

    #[tokio::test]
    async fn test_targets_are_deleted_in_provider_sized_batches() {
        let (store, b1, targets) = store_with_versions(2_500).await;
        let purger = BatchPurger::new(Arc::new(store.clone()));

        let outcome = purger.purge(&b1, &targets).await.unwrap();

        assert_eq!(store.delete_calls().await, vec![1_000, 1_000, 500]);
        assert_eq!(outcome.requested, 2_500);
        assert_eq!(outcome.deleted, 2_500);
        assert_eq!(outcome.batches, 3);
        assert!(outcome.failures.is_empty());
        assert!(store.remaining_versions(&b1, "key-0").await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_target_list_makes_no_calls() {
        let (store, b1, _) = store_with_versions(3).await;
        let purger = BatchPurger::new(Arc::new(store.clone()));

        let outcome = purger.purge(&b1, &[]).await.unwrap();

        assert!(store.delete_calls().await.is_empty());
        assert_eq!(outcome, PurgeOutcome::default());
    }

    #[tokio::test]
    async fn test_batch_size_is_clamped_to_provider_limit() {
        let (store, b1, targets) = store_with_versions(1_500).await;
        let purger = BatchPurger::new(Arc::new(store.clone())).with_batch_size(5_000);

        purger.purge(&b1, &targets).await.unwrap();

        assert_eq!(store.delete_calls().await, vec![1_000, 500]);
    }

    #[tokio::test]
    async fn test_per_item_failures_are_reported_not_raised() {
        let (store, b1, targets) = store_with_versions(10).await;
        store.protect_version(&b1, "v3").await.unwrap();
        store.protect_version(&b1, "v7").await.unwrap();
        let purger = BatchPurger::new(Arc::new(store.clone())).with_batch_size(4);

        let outcome = purger.purge(&b1, &targets).await.unwrap();

        assert_eq!(store.delete_calls().await, vec![4, 4, 2]);
        assert_eq!(outcome.deleted, 8);
        assert_eq!(outcome.unconfirmed(), 2);
        let failed: Vec<_> = outcome
            .failures
            .iter()
            .filter_map(|f| f.version_id.as_deref())
            .collect();
        assert_eq!(failed, vec!["v3", "v7"]);
    }

    #[tokio::test]
    async fn test_batch_call_failure_aborts_the_purge() {
        let (store, b1, targets) = store_with_versions(20).await;
        store
            .fail_on(StoreOperation::DeleteVersions, "AccessDenied")
            .await;
        let purger = BatchPurger::new(Arc::new(store.clone())).with_batch_size(5);

        let err = purger.purge(&b1, &targets).await.unwrap_err();

        assert_eq!(err, StorageError::remote("DeleteObjects", "AccessDenied"));
        // The first call failed, so nothing after it was attempted
        assert_eq!(store.delete_calls().await, vec![5]);
    }

    #[tokio::test]
    async fn test_batches_sent_before_a_failure_stay_deleted() {
        let store = InMemoryBucketStore::new();
        let b1 = bucket("b1-data");
        store.create_bucket(&b1, VersioningStatus::Enabled).await;
        let now = Utc::now();
        let mut targets = Vec::new();
        for i in 0..15 {
            let id = format!("v{i:02}");
            store.add_version(&b1, "key-0", &id, now, 1).await.unwrap();
            targets.push(PurgeTarget {
                key: ObjectKey::new("key-0".to_string()).unwrap(),
                version_id: VersionId::new(id).unwrap(),
            });
        }
        store.fail_delete_after(1, "InternalError").await;
        let purger = BatchPurger::new(Arc::new(store.clone())).with_batch_size(5);

        let err = purger.purge(&b1, &targets).await.unwrap_err();

        assert_eq!(err, StorageError::remote("DeleteObjects", "InternalError"));
        // Second call failed; the third was never sent
        assert_eq!(store.delete_calls().await, vec![5, 5]);
        let remaining = store.remaining_versions(&b1, "key-0").await;
        assert_eq!(remaining.len(), 10);
        assert!(remaining.iter().all(|r| r.version_id.as_str() >= "v05"));
    }
}
