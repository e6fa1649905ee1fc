use crate::domain::{
    errors::StorageResult,
    models::{PruneRequest, RunReport},
};
use async_trait::async_trait;

/// Service port for a complete pruning run
#[async_trait]
pub trait PruningService: Send + Sync + 'static {
    /// Select buckets, plan per bucket, and delete when the request is confirmed.
    ///
    /// The first error that is not a region mismatch aborts the run.
    async fn run(&self, request: &PruneRequest) -> StorageResult<RunReport>;
}
