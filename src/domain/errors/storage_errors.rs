use crate::domain::errors::ValidationError;

/// Errors surfaced by the remote storage capability
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The named bucket does not exist
    BucketNotFound { bucket: String },

    /// The bucket lives in a region the configured endpoint cannot reach
    RegionMismatch { bucket: String, message: String },

    /// Any other failure of a remote call
    RemoteCall { operation: String, message: String },

    /// Provider returned data that does not form a valid domain value
    Validation { message: String },
}

impl StorageError {
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::RemoteCall {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error only means the bucket cannot be inspected from here
    pub fn is_region_mismatch(&self) -> bool {
        matches!(self, StorageError::RegionMismatch { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::BucketNotFound { .. })
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::BucketNotFound { bucket } => {
                write!(f, "Bucket doesn't exist: {}", bucket)
            }
            StorageError::RegionMismatch { bucket, message } => {
                write!(
                    f,
                    "Bucket '{}' is not reachable from the configured region: {}",
                    bucket, message
                )
            }
            StorageError::RemoteCall { operation, message } => {
                write!(f, "{} failed: {}", operation, message)
            }
            StorageError::Validation { message } => {
                write!(f, "Validation error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::Validation {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
