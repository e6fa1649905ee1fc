use crate::domain::{models::retention::PurgeOutcome, value_objects::BucketName};
use serde::{Deserialize, Serialize};

/// Summary of what happened to one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketReport {
    pub bucket: BucketName,
    pub pages: usize,
    pub keys_scanned: usize,
    pub records_scanned: usize,
    pub keys_with_purges: usize,
    pub versions_to_delete: usize,
    pub reclaimable_bytes: u64,
    /// Present only when deletions were actually executed
    pub purge: Option<PurgeOutcome>,
}

/// Summary of a whole pruning run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub buckets: Vec<BucketReport>,
}

impl RunReport {
    pub fn versions_to_delete(&self) -> usize {
        self.buckets.iter().map(|b| b.versions_to_delete).sum()
    }

    pub fn reclaimable_bytes(&self) -> u64 {
        self.buckets.iter().map(|b| b.reclaimable_bytes).sum()
    }

    pub fn versions_deleted(&self) -> usize {
        self.buckets
            .iter()
            .filter_map(|b| b.purge.as_ref())
            .map(|p| p.deleted)
            .sum()
    }
}
