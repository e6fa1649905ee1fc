pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Value objects
    BucketName,
    // Models
    BucketReport,
    BucketTarget,
    ObjectKey,
    PruneRequest,
    PurgeOutcome,
    PurgeTarget,
    RetentionPlan,
    RetentionPolicy,
    RunReport,
    // Errors
    StorageError,
    StorageResult,
    ValidationError,
    VersionHistory,
    VersionId,
    VersionRecord,
    VersioningStatus,
};

// Port types - interfaces for external systems
pub use ports::{PruningService, VersionedBucketStore};

// Service implementations - business logic
pub use services::{
    BatchPurger, BucketSelector, PruningServiceImpl, RetentionEvaluator, VersionEnumerator,
};

// Application factory and configuration
pub use app::{
    create_in_memory_app, create_s3_app, AppBuilder, AppConfig, AppError, PruningApp,
    StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{InMemoryBucketStore, S3BucketStore, S3Config};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_app, create_s3_app, AppBuilder, BucketName, BucketTarget,
        InMemoryBucketStore, PruneRequest, PruningService, PruningServiceImpl, RetentionPolicy,
        S3Config, VersionedBucketStore,
    };
}
