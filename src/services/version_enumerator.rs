use humansize::{format_size, DECIMAL};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    domain::{
        errors::StorageResult,
        models::{ListingMarker, VersionHistory},
        value_objects::BucketName,
    },
    ports::storage::{ListVersionsRequest, VersionedBucketStore, MAX_LIST_PAGE_SIZE},
};

/// The full version history of a bucket and how many pages it took to read
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub history: VersionHistory,
    pub pages: usize,
}

/// Walks a bucket's paginated version listing into a [`VersionHistory`]
#[derive(Clone)]
pub struct VersionEnumerator {
    store: Arc<dyn VersionedBucketStore>,
    page_size: usize,
}

impl VersionEnumerator {
    pub fn new(store: Arc<dyn VersionedBucketStore>) -> Self {
        Self {
            store,
            page_size: MAX_LIST_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Read every live version and delete marker under `prefix`.
    ///
    /// Pages are requested one after another until the provider returns no
    /// continuation marker. Any listing failure aborts the enumeration.
    pub async fn enumerate(
        &self,
        bucket: &BucketName,
        prefix: Option<&str>,
    ) -> StorageResult<Enumeration> {
        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        let mut enumeration = Enumeration::default();
        let mut marker: Option<ListingMarker> = None;

        loop {
            let request = ListVersionsRequest::builder()
                .bucket(bucket.clone())
                .maybe_prefix(prefix.clone())
                .maybe_marker(marker.take())
                .max_keys(self.page_size)
                .build();

            let page = self.store.list_versions_page(&request).await?;
            enumeration.pages += 1;

            debug!(
                bucket = %bucket,
                page = enumeration.pages,
                versions = page.versions.len(),
                delete_markers = page.delete_markers.len(),
                "received version listing page"
            );
            info!(
                bucket = %bucket,
                "got {} versions for page {}",
                page.len(),
                enumeration.pages
            );

            marker = page.continuation().cloned();
            enumeration.history.extend_page(page);

            if marker.is_none() {
                break;
            }
        }

        info!(
            bucket = %bucket,
            pages = enumeration.pages,
            keys = enumeration.history.key_count(),
            records = enumeration.history.record_count(),
            size = %format_size(live_bytes(&enumeration.history), DECIMAL),
            "{} file versions for {} files",
            enumeration.history.record_count(),
            enumeration.history.key_count()
        );

        Ok(enumeration)
    }
}

fn live_bytes(history: &VersionHistory) -> u64 {
    history
        .iter()
        .flat_map(|(_, records)| records.iter())
        .filter(|r| r.is_live())
        .map(|r| r.size)
        .sum()
}
