use std::sync::Arc;

use crate::{
    adapters::outbound::storage::{InMemoryBucketStore, S3BucketStore, S3Config},
    domain::{
        errors::StorageResult,
        models::{PruneRequest, RunReport},
    },
    ports::{services::PruningService, storage::VersionedBucketStore},
    services::PruningServiceImpl,
};

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub prune: PruneRequest,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    /// Empty in-memory store, for smoke tests and development
    #[default]
    InMemory,
    S3(S3Config),
}

/// A wired pruning service together with the request it will execute
#[derive(Clone)]
pub struct PruningApp {
    pub pruning_service: PruningServiceImpl,
    pub request: PruneRequest,
}

impl PruningApp {
    /// Execute the configured request once
    pub async fn run(&self) -> StorageResult<RunReport> {
        self.pruning_service.run(&self.request).await
    }
}

/// Application builder for dependency injection
#[derive(Default)]
pub struct AppBuilder {
    storage_backend: StorageBackend,
    request: Option<PruneRequest>,
    store: Option<Arc<dyn VersionedBucketStore>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.storage_backend = config.storage_backend;
        self.request = Some(config.prune);
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage_backend = backend;
        self
    }

    pub fn with_request(mut self, request: PruneRequest) -> Self {
        self.request = Some(request);
        self
    }

    /// Use an already constructed store instead of the configured backend
    pub fn with_store(mut self, store: Arc<dyn VersionedBucketStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the storage adapter based on configuration
    pub async fn build_store(&self) -> Result<Arc<dyn VersionedBucketStore>, AppError> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }

        match &self.storage_backend {
            StorageBackend::InMemory => Ok(Arc::new(InMemoryBucketStore::new())),
            StorageBackend::S3(config) => {
                validate_s3_config(config)?;
                Ok(Arc::new(S3BucketStore::from_config(config).await))
            }
        }
    }

    /// Build the complete application
    pub async fn build(self) -> Result<PruningApp, AppError> {
        let store = self.build_store().await?;
        let request = self.request.ok_or_else(|| AppError::Configuration {
            message: "no prune request configured".to_string(),
        })?;

        Ok(PruningApp {
            pruning_service: PruningServiceImpl::new(store),
            request,
        })
    }
}

fn validate_s3_config(config: &S3Config) -> Result<(), AppError> {
    match (&config.access_key, &config.secret_key) {
        (Some(_), None) | (None, Some(_)) => Err(AppError::Configuration {
            message: "S3 access key and secret key must be given together".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Create an application over an existing in-memory store
pub async fn create_in_memory_app(
    store: InMemoryBucketStore,
    request: PruneRequest,
) -> Result<PruningApp, AppError> {
    AppBuilder::new()
        .with_store(Arc::new(store))
        .with_request(request)
        .build()
        .await
}

/// Create an S3-backed application
pub async fn create_s3_app(
    config: S3Config,
    request: PruneRequest,
) -> Result<PruningApp, AppError> {
    AppBuilder::new()
        .with_config(AppConfig {
            storage_backend: StorageBackend::S3(config),
            prune: request,
        })
        .build()
        .await
}
