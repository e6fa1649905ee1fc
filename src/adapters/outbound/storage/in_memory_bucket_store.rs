use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{
            DeleteBatchResult, ListingMarker, PurgeFailure, PurgeTarget, VersionPage,
            VersionRecord, VersioningStatus,
        },
        value_objects::{BucketName, ObjectKey, VersionId},
    },
    ports::storage::{
        ListVersionsRequest, VersionedBucketStore, MAX_DELETE_BATCH_SIZE, MAX_LIST_PAGE_SIZE,
    },
};

/// Remote operations of [`VersionedBucketStore`], used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListBuckets,
    BucketExists,
    GetVersioningStatus,
    ListVersions,
    DeleteVersions,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::ListBuckets => "ListBuckets",
            StoreOperation::BucketExists => "HeadBucket",
            StoreOperation::GetVersioningStatus => "GetBucketVersioning",
            StoreOperation::ListVersions => "ListObjectVersions",
            StoreOperation::DeleteVersions => "DeleteObjects",
        }
    }
}

/// In-memory implementation of VersionedBucketStore for testing and development.
///
/// Listing follows S3 ordering (key ascending, newest version first) and
/// pages with the same key/version-id marker pair the real service returns.
#[derive(Clone)]
pub struct InMemoryBucketStore {
    data: Arc<RwLock<StoreData>>,
    page_size: usize,
}

#[derive(Default)]
struct StoreData {
    buckets: BTreeMap<BucketName, StoredBucket>,
    failures: HashMap<StoreOperation, String>,
    // Delete calls allowed to succeed before every later one fails
    delete_budget: Option<(usize, String)>,
    delete_calls: Vec<usize>,
    list_calls: usize,
}

struct StoredBucket {
    versioning: VersioningStatus,
    region_mismatch: bool,
    objects: BTreeMap<ObjectKey, Vec<VersionRecord>>,
    // Versions whose deletion is reported as a per-item error
    protected: HashSet<VersionId>,
}

impl InMemoryBucketStore {
    pub fn new() -> Self {
        Self::with_page_size(MAX_LIST_PAGE_SIZE)
    }

    /// Cap every listing page at `page_size` entries regardless of the request
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData::default())),
            page_size: page_size.max(1),
        }
    }

    pub async fn create_bucket(&self, bucket: &BucketName, versioning: VersioningStatus) {
        let mut data = self.data.write().await;
        data.buckets.insert(
            bucket.clone(),
            StoredBucket {
                versioning,
                region_mismatch: false,
                objects: BTreeMap::new(),
                protected: HashSet::new(),
            },
        );
    }

    /// Make the versioning probe for this bucket fail as if it lived in another region
    pub async fn place_in_other_region(&self, bucket: &BucketName) -> StorageResult<()> {
        let mut data = self.data.write().await;
        Self::bucket_mut(&mut data, bucket)?.region_mismatch = true;
        Ok(())
    }

    /// Add a live version with an explicit id
    pub async fn add_version(
        &self,
        bucket: &BucketName,
        key: &str,
        version_id: &str,
        last_modified: DateTime<Utc>,
        size: u64,
    ) -> StorageResult<()> {
        let record = VersionRecord::version(
            ObjectKey::new(key.to_string())?,
            VersionId::new(version_id.to_string())?,
            false,
            last_modified,
            size,
        );
        self.insert(bucket, record).await
    }

    /// Add a delete marker with an explicit id
    pub async fn add_delete_marker(
        &self,
        bucket: &BucketName,
        key: &str,
        version_id: &str,
        last_modified: DateTime<Utc>,
    ) -> StorageResult<()> {
        let record = VersionRecord::delete_marker(
            ObjectKey::new(key.to_string())?,
            VersionId::new(version_id.to_string())?,
            false,
            last_modified,
        );
        self.insert(bucket, record).await
    }

    /// Add a live version stamped now with a generated id
    pub async fn put_version(
        &self,
        bucket: &BucketName,
        key: &str,
        size: u64,
    ) -> StorageResult<VersionId> {
        let version_id = VersionId::generate();
        self.add_version(bucket, key, version_id.as_str(), Utc::now(), size)
            .await?;
        Ok(version_id)
    }

    /// Report a per-item error instead of deleting this version
    pub async fn protect_version(&self, bucket: &BucketName, version_id: &str) -> StorageResult<()> {
        let version_id = VersionId::new(version_id.to_string())?;
        let mut data = self.data.write().await;
        Self::bucket_mut(&mut data, bucket)?
            .protected
            .insert(version_id);
        Ok(())
    }

    /// Make every subsequent call of `operation` fail
    pub async fn fail_on(&self, operation: StoreOperation, message: &str) {
        let mut data = self.data.write().await;
        data.failures.insert(operation, message.to_string());
    }

    /// Let the next `calls` delete calls through, then fail every one after them
    pub async fn fail_delete_after(&self, calls: usize, message: &str) {
        let mut data = self.data.write().await;
        data.delete_budget = Some((calls, message.to_string()));
    }

    /// Sizes of every `delete_versions` call so far, in call order
    pub async fn delete_calls(&self) -> Vec<usize> {
        self.data.read().await.delete_calls.clone()
    }

    pub async fn list_calls(&self) -> usize {
        self.data.read().await.list_calls
    }

    /// Records still stored for a key, newest first
    pub async fn remaining_versions(&self, bucket: &BucketName, key: &str) -> Vec<VersionRecord> {
        let data = self.data.read().await;
        data.buckets
            .get(bucket)
            .and_then(|b| b.objects.iter().find(|(k, _)| k.as_str() == key))
            .map(|(_, records)| newest_first(records))
            .unwrap_or_default()
    }

    async fn insert(&self, bucket: &BucketName, record: VersionRecord) -> StorageResult<()> {
        let mut data = self.data.write().await;
        Self::bucket_mut(&mut data, bucket)?
            .objects
            .entry(record.key.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    fn bucket_mut<'a>(
        data: &'a mut StoreData,
        bucket: &BucketName,
    ) -> StorageResult<&'a mut StoredBucket> {
        data.buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })
    }

    fn check_failure(data: &StoreData, operation: StoreOperation) -> StorageResult<()> {
        match data.failures.get(&operation) {
            Some(message) => Err(StorageError::remote(operation.as_str(), message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryBucketStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(records: &[VersionRecord]) -> Vec<VersionRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    if let Some(head) = sorted.first_mut() {
        head.is_latest = true;
    }
    sorted
}

#[async_trait]
impl VersionedBucketStore for InMemoryBucketStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketName>> {
        let data = self.data.read().await;
        Self::check_failure(&data, StoreOperation::ListBuckets)?;
        Ok(data.buckets.keys().cloned().collect())
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        let data = self.data.read().await;
        Self::check_failure(&data, StoreOperation::BucketExists)?;
        Ok(data.buckets.contains_key(bucket))
    }

    async fn get_versioning_status(
        &self,
        bucket: &BucketName,
    ) -> StorageResult<VersioningStatus> {
        let data = self.data.read().await;
        Self::check_failure(&data, StoreOperation::GetVersioningStatus)?;

        let stored = data
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;

        if stored.region_mismatch {
            return Err(StorageError::RegionMismatch {
                bucket: bucket.to_string(),
                message: "BucketRegionError".to_string(),
            });
        }

        Ok(stored.versioning)
    }

    async fn list_versions_page(
        &self,
        request: &ListVersionsRequest,
    ) -> StorageResult<VersionPage> {
        let mut data = self.data.write().await;
        data.list_calls += 1;
        Self::check_failure(&data, StoreOperation::ListVersions)?;

        let stored = data
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: request.bucket.to_string(),
            })?;

        let prefix = request.prefix.as_deref().unwrap_or_default();
        let listing: Vec<VersionRecord> = stored
            .objects
            .iter()
            .filter(|(key, _)| key.has_prefix(prefix))
            .flat_map(|(_, records)| newest_first(records))
            .collect();

        let start = match &request.marker {
            None => 0,
            Some(marker) => resume_position(&listing, marker),
        };

        let page_size = request.max_keys.min(self.page_size).max(1);
        let end = (start + page_size).min(listing.len());
        let page_records = &listing[start..end];

        let next_marker = if end < listing.len() {
            page_records.last().map(|last| {
                ListingMarker::new(last.key.as_str()).with_version_id(last.version_id.as_str())
            })
        } else {
            None
        };

        let (delete_markers, versions): (Vec<_>, Vec<_>) = page_records
            .iter()
            .cloned()
            .partition(|record| record.is_delete_marker);

        Ok(VersionPage {
            versions,
            delete_markers,
            next_marker,
        })
    }

    async fn delete_versions(
        &self,
        bucket: &BucketName,
        targets: &[PurgeTarget],
    ) -> StorageResult<DeleteBatchResult> {
        let mut data = self.data.write().await;
        data.delete_calls.push(targets.len());
        Self::check_failure(&data, StoreOperation::DeleteVersions)?;
        if let Some((allowed, message)) = &data.delete_budget {
            if data.delete_calls.len() > *allowed {
                return Err(StorageError::remote(
                    StoreOperation::DeleteVersions.as_str(),
                    message.clone(),
                ));
            }
        }

        if targets.len() > MAX_DELETE_BATCH_SIZE {
            return Err(StorageError::remote(
                StoreOperation::DeleteVersions.as_str(),
                format!(
                    "MalformedXML: {} objects exceeds the limit of {}",
                    targets.len(),
                    MAX_DELETE_BATCH_SIZE
                ),
            ));
        }

        let stored = Self::bucket_mut(&mut data, bucket)?;
        let mut result = DeleteBatchResult::default();

        for target in targets {
            if stored.protected.contains(&target.version_id) {
                result
                    .failures
                    .push(PurgeFailure::for_target(target, "AccessDenied", "Access Denied"));
                continue;
            }

            if let Some(records) = stored.objects.get_mut(&target.key) {
                records.retain(|r| r.version_id != target.version_id);
                if records.is_empty() {
                    stored.objects.remove(&target.key);
                }
            }
            // S3 confirms deletion of ids that no longer exist as well
            result.deleted.push(target.clone());
        }

        Ok(result)
    }
}

/// Index of the first entry after the marker
fn resume_position(listing: &[VersionRecord], marker: &ListingMarker) -> usize {
    match &marker.version_id_marker {
        Some(version_id) => listing
            .iter()
            .position(|r| r.key.as_str() == marker.key_marker && r.version_id.as_str() == version_id.as_str())
            .map(|idx| idx + 1)
            .unwrap_or_else(|| past_key(listing, &marker.key_marker)),
        None => past_key(listing, &marker.key_marker),
    }
}

fn past_key(listing: &[VersionRecord], key_marker: &str) -> usize {
    listing
        .iter()
        .position(|r| r.key.as_str() > key_marker)
        .unwrap_or(listing.len())
}
