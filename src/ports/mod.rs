pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use services::PruningService;
pub use storage::{ListVersionsRequest, VersionedBucketStore};
