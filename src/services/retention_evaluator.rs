use humansize::{format_size, DECIMAL};
use tracing::info;

use crate::domain::{
    models::{KeyPurgePlan, RetentionPlan, RetentionPolicy, VersionHistory, VersionRecord},
    value_objects::{BucketName, ObjectKey},
};

/// Decides which versions of each key fall outside the retention window.
///
/// Only live versions consume a keep slot. Delete markers newer than the
/// last kept live version are kept; everything older than it is purged.
/// Keys with no more records than the policy keeps are never touched.
#[derive(Debug, Clone, Copy)]
pub struct RetentionEvaluator {
    policy: RetentionPolicy,
}

impl RetentionEvaluator {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Build the purge plan for a whole bucket. Pure: the same history
    /// always yields the same plan.
    pub fn evaluate(&self, history: &VersionHistory) -> RetentionPlan {
        let mut plan = RetentionPlan::default();

        for (key, records) in history.iter() {
            if self.policy.exempts(records.len()) {
                continue;
            }
            plan.push_key(self.evaluate_key(key, records));
        }

        plan
    }

    fn evaluate_key(&self, key: &ObjectKey, records: &[VersionRecord]) -> KeyPurgePlan {
        let mut ordered: Vec<&VersionRecord> = records.iter().collect();
        // Stable, so equal timestamps keep listing order
        ordered.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        let mut live_seen = 0;
        let mut kept = 0;
        let mut purged = Vec::new();

        for record in ordered {
            if live_seen >= self.policy.keep {
                purged.push(record.clone());
            } else {
                kept += 1;
            }
            if record.is_live() {
                live_seen += 1;
            }
        }

        KeyPurgePlan {
            key: key.clone(),
            kept,
            purged,
        }
    }

    /// Write the operator report for a plan
    pub fn log_plan(&self, bucket: &BucketName, plan: &RetentionPlan) {
        for key_plan in &plan.keys {
            info!(
                bucket = %bucket,
                key = %key_plan.key,
                kept = key_plan.kept,
                "versions to delete for {} (count = {})",
                key_plan.key,
                key_plan.purged.len()
            );
            for record in &key_plan.purged {
                info!(
                    bucket = %bucket,
                    key = %record.key,
                    delete_marker = record.is_delete_marker,
                    last_modified = %record.last_modified,
                    "  {} ({})",
                    record.version_id,
                    format_size(record.size, DECIMAL)
                );
            }
        }

        info!(
            bucket = %bucket,
            bytes = plan.reclaimable_bytes,
            "total space recovered: {}",
            format_size(plan.reclaimable_bytes, DECIMAL)
        );
        info!(bucket = %bucket, "total versions to delete: {}", plan.len());
    }
}
