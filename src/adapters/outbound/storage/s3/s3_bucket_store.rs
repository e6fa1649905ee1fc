use async_trait::async_trait;
use aws_sdk_s3::primitives::DateTime as AwsDateTime;
use aws_sdk_s3::types::{
    BucketVersioningStatus, Delete, DeleteMarkerEntry, DeletedObject, ObjectIdentifier,
    ObjectVersion,
};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    adapters::outbound::storage::{
        error::{StoreError, GET_VERSIONING_OPERATION},
        s3::{create_s3_client, S3Config},
    },
    domain::{
        errors::StorageResult,
        models::{
            DeleteBatchResult, ListingMarker, PurgeFailure, PurgeTarget, VersionPage,
            VersionRecord, VersioningStatus,
        },
        value_objects::{BucketName, ObjectKey, VersionId},
    },
    ports::storage::{ListVersionsRequest, VersionedBucketStore},
};

/// S3 adapter that implements the VersionedBucketStore port
#[derive(Clone)]
pub struct S3BucketStore {
    client: Client,
}

impl S3BucketStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the SDK client from configuration and wrap it
    pub async fn from_config(config: &S3Config) -> Self {
        Self::new(create_s3_client(config).await)
    }

    async fn fetch_all_bucket_names(&self) -> Result<Vec<BucketName>, StoreError> {
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_buckets()
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("ListBuckets", None, e))?;

            for bucket in response.buckets() {
                let name = bucket.name().ok_or(StoreError::InvalidResponse {
                    operation: "ListBuckets",
                    field: "Name",
                })?;
                match BucketName::new(name.to_string()) {
                    Ok(name) => names.push(name),
                    // Legacy us-east-1 names may break today's naming rules
                    Err(e) => warn!(bucket = name, error = %e, "skipping bucket with unsupported name"),
                }
            }

            match response.continuation_token() {
                Some(token) if !token.is_empty() => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn head_bucket(&self, bucket: &BucketName) -> Result<bool, StoreError> {
        match self
            .client
            .head_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = StoreError::from_sdk("HeadBucket", Some(bucket.as_str()), e);
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn fetch_versioning(&self, bucket: &BucketName) -> Result<VersioningStatus, StoreError> {
        let response = self
            .client
            .get_bucket_versioning()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| {
                StoreError::from_sdk(GET_VERSIONING_OPERATION, Some(bucket.as_str()), e)
            })?;

        Ok(match response.status() {
            Some(BucketVersioningStatus::Enabled) => VersioningStatus::Enabled,
            Some(BucketVersioningStatus::Suspended) => VersioningStatus::Suspended,
            _ => VersioningStatus::Unset,
        })
    }

    async fn fetch_versions_page(
        &self,
        request: &ListVersionsRequest,
    ) -> Result<VersionPage, StoreError> {
        let bucket = request.bucket.as_str();
        let max_keys = i32::try_from(request.max_keys).unwrap_or(i32::MAX);

        let response = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .set_prefix(request.prefix.clone())
            .set_key_marker(request.marker.as_ref().map(|m| m.key_marker.clone()))
            .set_version_id_marker(
                request
                    .marker
                    .as_ref()
                    .and_then(|m| m.version_id_marker.clone()),
            )
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| StoreError::from_sdk("ListObjectVersions", Some(bucket), e))?;

        let versions = response
            .versions()
            .iter()
            .map(object_version_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        let delete_markers = response
            .delete_markers()
            .iter()
            .map(delete_marker_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        let next_marker = response.next_key_marker().map(|key_marker| {
            let marker = ListingMarker::new(key_marker);
            match response.next_version_id_marker() {
                Some(version_id) => marker.with_version_id(version_id),
                None => marker,
            }
        });

        Ok(VersionPage {
            versions,
            delete_markers,
            next_marker,
        })
    }

    async fn send_delete(
        &self,
        bucket: &BucketName,
        targets: &[PurgeTarget],
    ) -> Result<DeleteBatchResult, StoreError> {
        let objects = targets
            .iter()
            .map(|target| {
                ObjectIdentifier::builder()
                    .key(target.key.as_str())
                    .version_id(target.version_id.as_str())
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()?;

        debug!(bucket = %bucket, batch_size = targets.len(), "sending DeleteObjects request");

        let response = self
            .client
            .delete_objects()
            .bucket(bucket.as_str())
            .delete(delete)
            .send()
            .await
            .map_err(|e| StoreError::from_sdk("DeleteObjects", Some(bucket.as_str()), e))?;

        let mut result = DeleteBatchResult::default();

        tally_deleted(&mut result, response.deleted());
        if result.unidentified > 0 {
            warn!(
                bucket = %bucket,
                count = result.unidentified,
                "deleted entries without a readable key or version id"
            );
        }

        for error in response.errors() {
            result.failures.push(PurgeFailure {
                key: error.key().unwrap_or("unknown").to_string(),
                version_id: error.version_id().map(str::to_string),
                code: error.code().map(str::to_string),
                message: error.message().map(str::to_string),
            });
        }

        Ok(result)
    }
}

/// Count every confirmed deletion, whether or not it can be mapped back to a target
fn tally_deleted(result: &mut DeleteBatchResult, deleted: &[DeletedObject]) {
    for entry in deleted {
        match deleted_target(entry) {
            Some(target) => result.deleted.push(target),
            None => result.unidentified += 1,
        }
    }
}

fn deleted_target(entry: &DeletedObject) -> Option<PurgeTarget> {
    Some(PurgeTarget {
        key: ObjectKey::new(entry.key()?.to_string()).ok()?,
        version_id: VersionId::new(entry.version_id()?.to_string()).ok()?,
    })
}

fn to_chrono(
    value: Option<&AwsDateTime>,
    operation: &'static str,
) -> Result<DateTime<Utc>, StoreError> {
    value
        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .ok_or(StoreError::InvalidResponse {
            operation,
            field: "LastModified",
        })
}

fn object_version_to_record(version: &ObjectVersion) -> Result<VersionRecord, StoreError> {
    const OPERATION: &str = "ListObjectVersions";

    let key = version.key().ok_or(StoreError::InvalidResponse {
        operation: OPERATION,
        field: "Version.Key",
    })?;
    let version_id = version.version_id().ok_or(StoreError::InvalidResponse {
        operation: OPERATION,
        field: "Version.VersionId",
    })?;

    Ok(VersionRecord::version(
        ObjectKey::new(key.to_string())?,
        VersionId::new(version_id.to_string())?,
        version.is_latest().unwrap_or(false),
        to_chrono(version.last_modified(), OPERATION)?,
        version
            .size()
            .and_then(|size| u64::try_from(size).ok())
            .unwrap_or(0),
    ))
}

fn delete_marker_to_record(marker: &DeleteMarkerEntry) -> Result<VersionRecord, StoreError> {
    const OPERATION: &str = "ListObjectVersions";

    let key = marker.key().ok_or(StoreError::InvalidResponse {
        operation: OPERATION,
        field: "DeleteMarker.Key",
    })?;
    let version_id = marker.version_id().ok_or(StoreError::InvalidResponse {
        operation: OPERATION,
        field: "DeleteMarker.VersionId",
    })?;

    Ok(VersionRecord::delete_marker(
        ObjectKey::new(key.to_string())?,
        VersionId::new(version_id.to_string())?,
        marker.is_latest().unwrap_or(false),
        to_chrono(marker.last_modified(), OPERATION)?,
    ))
}

#[async_trait]
impl VersionedBucketStore for S3BucketStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketName>> {
        Ok(self.fetch_all_bucket_names().await?)
    }

    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        Ok(self.head_bucket(bucket).await?)
    }

    async fn get_versioning_status(
        &self,
        bucket: &BucketName,
    ) -> StorageResult<VersioningStatus> {
        Ok(self.fetch_versioning(bucket).await?)
    }

    async fn list_versions_page(
        &self,
        request: &ListVersionsRequest,
    ) -> StorageResult<VersionPage> {
        Ok(self.fetch_versions_page(request).await?)
    }

    async fn delete_versions(
        &self,
        bucket: &BucketName,
        targets: &[PurgeTarget],
    ) -> StorageResult<DeleteBatchResult> {
        Ok(self.send_delete(bucket, targets).await?)
    }
}
