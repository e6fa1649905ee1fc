use async_trait::async_trait;
use humansize::{format_size, DECIMAL};
use std::sync::Arc;
use tracing::info;

use crate::{
    domain::{
        errors::StorageResult,
        models::{BucketReport, PruneRequest, RunReport},
        value_objects::BucketName,
    },
    ports::{services::PruningService, storage::VersionedBucketStore},
    services::{BatchPurger, BucketSelector, RetentionEvaluator, VersionEnumerator},
};

/// Implementation of PruningService driving the four pruning stages in order
#[derive(Clone)]
pub struct PruningServiceImpl {
    selector: BucketSelector,
    enumerator: VersionEnumerator,
    purger: BatchPurger,
}

impl PruningServiceImpl {
    /// Create a new PruningServiceImpl sharing one store between all stages
    pub fn new(store: Arc<dyn VersionedBucketStore>) -> Self {
        Self {
            selector: BucketSelector::new(store.clone()),
            enumerator: VersionEnumerator::new(store.clone()),
            purger: BatchPurger::new(store),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.enumerator = self.enumerator.with_page_size(page_size);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.purger = self.purger.with_batch_size(batch_size);
        self
    }

    async fn prune_bucket(
        &self,
        bucket: BucketName,
        request: &PruneRequest,
        evaluator: &RetentionEvaluator,
    ) -> StorageResult<BucketReport> {
        info!(
            bucket = %bucket,
            prefix = request.prefix_display(),
            keep = request.policy.keep,
            "Listing versions"
        );

        let enumeration = self
            .enumerator
            .enumerate(&bucket, request.prefix.as_deref())
            .await?;

        let plan = evaluator.evaluate(&enumeration.history);
        evaluator.log_plan(&bucket, &plan);

        let purge = if request.confirm && !plan.is_empty() {
            Some(self.purger.purge(&bucket, &plan.targets).await?)
        } else {
            None
        };

        Ok(BucketReport {
            bucket,
            pages: enumeration.pages,
            keys_scanned: enumeration.history.key_count(),
            records_scanned: enumeration.history.record_count(),
            keys_with_purges: plan.keys_with_purges(),
            versions_to_delete: plan.len(),
            reclaimable_bytes: plan.reclaimable_bytes,
            purge,
        })
    }
}

#[async_trait]
impl PruningService for PruningServiceImpl {
    async fn run(&self, request: &PruneRequest) -> StorageResult<RunReport> {
        let evaluator = RetentionEvaluator::new(request.policy);
        let buckets = self.selector.select(&request.target).await?;

        let mut report = RunReport {
            dry_run: !request.confirm,
            buckets: Vec::with_capacity(buckets.len()),
        };

        for bucket in buckets {
            let bucket_report = self.prune_bucket(bucket, request, &evaluator).await?;
            report.buckets.push(bucket_report);
        }

        if report.dry_run {
            info!(
                versions = report.versions_to_delete(),
                size = %format_size(report.reclaimable_bytes(), DECIMAL),
                "dry run finished, nothing was deleted; pass --confirm to delete"
            );
        } else {
            info!(
                versions = report.versions_deleted(),
                size = %format_size(report.reclaimable_bytes(), DECIMAL),
                "pruning finished"
            );
        }

        Ok(report)
    }
}
