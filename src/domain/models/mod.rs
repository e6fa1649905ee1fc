pub mod bucket;
pub mod report;
pub mod request;
pub mod retention;
pub mod version;

pub use bucket::{BucketIdentity, BucketTarget, VersioningStatus};
pub use report::{BucketReport, RunReport};
pub use request::PruneRequest;
pub use retention::{
    DeleteBatchResult, KeyPurgePlan, PurgeFailure, PurgeOutcome, RetentionPlan, RetentionPolicy,
};
pub use version::{ListingMarker, PurgeTarget, VersionHistory, VersionPage, VersionRecord};
