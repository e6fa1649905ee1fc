use crate::domain::{
    models::version::{PurgeTarget, VersionRecord},
    value_objects::ObjectKey,
};
use serde::{Deserialize, Serialize};

/// Keep the `keep` most recent live versions of every key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep: usize,
}

impl RetentionPolicy {
    pub fn keep_latest(keep: usize) -> Self {
        Self { keep }
    }

    /// Keys with this many records or fewer are never touched
    pub fn exempts(&self, record_count: usize) -> bool {
        record_count <= self.keep
    }
}

/// What the evaluator decided for a single key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPurgePlan {
    pub key: ObjectKey,
    pub kept: usize,
    /// Purged records, newest first
    pub purged: Vec<VersionRecord>,
}

impl KeyPurgePlan {
    pub fn reclaimable_bytes(&self) -> u64 {
        self.purged.iter().map(|r| r.size).sum()
    }
}

/// Purge decision for one bucket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionPlan {
    pub keys: Vec<KeyPurgePlan>,
    pub targets: Vec<PurgeTarget>,
    /// Bytes held by purged live versions; markers count as zero
    pub reclaimable_bytes: u64,
}

impl RetentionPlan {
    pub fn push_key(&mut self, plan: KeyPurgePlan) {
        self.reclaimable_bytes += plan.reclaimable_bytes();
        self.targets
            .extend(plan.purged.iter().map(VersionRecord::purge_target));
        self.keys.push(plan);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn keys_with_purges(&self) -> usize {
        self.keys.iter().filter(|k| !k.purged.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A per-item failure reported inside an otherwise successful batch delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurgeFailure {
    pub key: String,
    pub version_id: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Result of one bulk delete call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteBatchResult {
    pub deleted: Vec<PurgeTarget>,
    /// Confirmed deletions whose key or version id could not be read back
    pub unidentified: usize,
    pub failures: Vec<PurgeFailure>,
}

impl DeleteBatchResult {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len() + self.unidentified
    }
}

/// Totals for a whole purge of one bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurgeOutcome {
    pub requested: usize,
    pub deleted: usize,
    pub batches: usize,
    pub failures: Vec<PurgeFailure>,
}

impl PurgeOutcome {
    /// Requested entries the provider did not confirm
    pub fn unconfirmed(&self) -> usize {
        self.requested.saturating_sub(self.deleted)
    }
}

impl PurgeFailure {
    pub fn for_target(target: &PurgeTarget, code: &str, message: &str) -> Self {
        Self {
            key: target.key.to_string(),
            version_id: Some(target.version_id.to_string()),
            code: Some(code.to_string()),
            message: Some(message.to_string()),
        }
    }
}
