// Infrastructure error types
pub mod error;

// Storage implementations
pub mod in_memory_bucket_store;

// Provider-specific implementations
pub mod s3;

// Re-export key types
pub use error::StoreError;
pub use in_memory_bucket_store::{InMemoryBucketStore, StoreOperation};
pub use s3::{S3BucketStore, S3Config};
