use crate::domain::{
    errors::StorageResult,
    models::{DeleteBatchResult, ListingMarker, PurgeTarget, VersionPage, VersioningStatus},
    value_objects::BucketName,
};
use async_trait::async_trait;

/// Largest page S3 will return for a version listing
pub const MAX_LIST_PAGE_SIZE: usize = 10_000;

/// Largest number of entries S3 accepts in one DeleteObjects call
pub const MAX_DELETE_BATCH_SIZE: usize = 1_000;

/// Port for the remote storage operations a pruning run needs
#[async_trait]
pub trait VersionedBucketStore: Send + Sync + 'static {
    /// Every bucket visible to the configured credentials
    async fn list_buckets(&self) -> StorageResult<Vec<BucketName>>;

    /// `Ok(false)` only when the provider says the bucket does not exist
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool>;

    /// Fails with `StorageError::RegionMismatch` when the bucket cannot be
    /// inspected from the configured region
    async fn get_versioning_status(&self, bucket: &BucketName)
        -> StorageResult<VersioningStatus>;

    /// Fetch one page of versions and delete markers
    async fn list_versions_page(&self, request: &ListVersionsRequest)
        -> StorageResult<VersionPage>;

    /// Delete at most [`MAX_DELETE_BATCH_SIZE`] specific versions in one call
    async fn delete_versions(
        &self,
        bucket: &BucketName,
        targets: &[PurgeTarget],
    ) -> StorageResult<DeleteBatchResult>;
}

/// Parameters of one version listing call
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct ListVersionsRequest {
    pub bucket: BucketName,
    pub prefix: Option<String>,
    pub marker: Option<ListingMarker>,
    #[builder(default = MAX_LIST_PAGE_SIZE)]
    pub max_keys: usize,
}
