use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{BucketIdentity, BucketTarget},
        value_objects::BucketName,
    },
    ports::storage::VersionedBucketStore,
};

/// Resolves a bucket target into the versioning-enabled buckets to prune
#[derive(Clone)]
pub struct BucketSelector {
    store: Arc<dyn VersionedBucketStore>,
}

impl BucketSelector {
    pub fn new(store: Arc<dyn VersionedBucketStore>) -> Self {
        Self { store }
    }

    /// Buckets named by the target, before any versioning check
    pub async fn candidates(&self, target: &BucketTarget) -> StorageResult<Vec<BucketName>> {
        match target {
            BucketTarget::All => {
                info!("List all buckets ...");
                self.store.list_buckets().await
            }
            BucketTarget::Named(bucket) => {
                if !self.store.bucket_exists(bucket).await? {
                    return Err(StorageError::BucketNotFound {
                        bucket: bucket.to_string(),
                    });
                }
                Ok(vec![bucket.clone()])
            }
        }
    }

    /// Probe one bucket's versioning status.
    ///
    /// A region mismatch yields an identity with unknown versioning instead
    /// of an error; any other failure is returned.
    pub async fn identify(&self, bucket: BucketName) -> StorageResult<BucketIdentity> {
        match self.store.get_versioning_status(&bucket).await {
            Ok(status) => Ok(BucketIdentity {
                name: bucket,
                versioning: Some(status),
            }),
            Err(err) if err.is_region_mismatch() => {
                warn!(bucket = %bucket, error = %err, "skipping bucket outside the configured region");
                Ok(BucketIdentity {
                    name: bucket,
                    versioning: None,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Keep only buckets whose versioning is enabled
    pub async fn filter_versioned(&self, buckets: Vec<BucketName>) -> StorageResult<Vec<BucketName>> {
        let mut versioned = Vec::with_capacity(buckets.len());

        for bucket in buckets {
            let identity = self.identify(bucket).await?;
            if identity.is_prunable() {
                versioned.push(identity.name);
            }
        }

        Ok(versioned)
    }

    /// Resolve the target into the buckets a run should process
    pub async fn select(&self, target: &BucketTarget) -> StorageResult<Vec<BucketName>> {
        let buckets = self.candidates(target).await?;
        info!(buckets = ?names(&buckets), "Found these buckets");

        let versioned = self.filter_versioned(buckets).await?;
        info!(buckets = ?names(&versioned), "Found these buckets with versioning enabled");

        Ok(versioned)
    }
}

fn names(buckets: &[BucketName]) -> Vec<&str> {
    buckets.iter().map(BucketName::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::{InMemoryBucketStore, StoreOperation};
    use crate::domain::models::VersioningStatus;

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name.to_string()).unwrap()
    }

    async fn fixture() -> (InMemoryBucketStore, BucketSelector) {
        let store = InMemoryBucketStore::new();
        store.create_bucket(&bucket("b1-data"), VersioningStatus::Enabled).await;
        store.create_bucket(&bucket("b2-data"), VersioningStatus::Unset).await;
        store.create_bucket(&bucket("b3-data"), VersioningStatus::Suspended).await;
        store
            .create_bucket(&bucket("bucket-in-wrong-region"), VersioningStatus::Enabled)
            .await;
        store
            .place_in_other_region(&bucket("bucket-in-wrong-region"))
            .await
            .unwrap();

        let selector = BucketSelector::new(Arc::new(store.clone()));
        (store, selector)
    }

    #[tokio::test]
    async fn test_all_target_lists_every_bucket() {
        let (_, selector) = fixture().await;

        let mut buckets = selector.candidates(&BucketTarget::All).await.unwrap();
        buckets.sort();
        assert_eq!(
            buckets,
            vec![
                bucket("b1-data"),
                bucket("b2-data"),
                bucket("b3-data"),
                bucket("bucket-in-wrong-region")
            ]
        );
    }

    #[tokio::test]
    async fn test_named_target_must_exist() {
        let (_, selector) = fixture().await;

        let buckets = selector
            .candidates(&BucketTarget::Named(bucket("b1-data")))
            .await
            .unwrap();
        assert_eq!(buckets, vec![bucket("b1-data")]);

        let err = selector
            .candidates(&BucketTarget::Named(bucket("missing-bucket")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Bucket doesn't exist"));
    }

    #[tokio::test]
    async fn test_existence_probe_failure_is_surfaced_unchanged() {
        let (store, selector) = fixture().await;
        store.fail_on(StoreOperation::BucketExists, "Forbidden").await;

        let err = selector
            .candidates(&BucketTarget::Named(bucket("b1-data")))
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::remote("HeadBucket", "Forbidden"));
    }

    #[tokio::test]
    async fn test_only_versioned_buckets_survive() {
        let (_, selector) = fixture().await;

        let buckets = selector.select(&BucketTarget::All).await.unwrap();
        assert_eq!(buckets, vec![bucket("b1-data")]);
    }

    #[tokio::test]
    async fn test_region_mismatch_is_not_fatal() {
        let (_, selector) = fixture().await;

        let identity = selector
            .identify(bucket("bucket-in-wrong-region"))
            .await
            .unwrap();
        assert_eq!(identity.versioning, None);
        assert!(!identity.is_prunable());
    }

    #[tokio::test]
    async fn test_other_versioning_probe_errors_abort() {
        let (store, selector) = fixture().await;
        store
            .fail_on(StoreOperation::GetVersioningStatus, "InternalError")
            .await;

        let err = selector.select(&BucketTarget::All).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::remote("GetBucketVersioning", "InternalError")
        );
    }
}
