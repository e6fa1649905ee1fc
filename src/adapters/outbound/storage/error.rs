use crate::domain::errors::{StorageError, ValidationError};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error as ThisError;

/// Provider error codes meaning "this bucket is served from another region"
const REGION_MISMATCH_CODES: &[&str] = &[
    "PermanentRedirect",
    "AuthorizationHeaderMalformed",
    "IllegalLocationConstraintException",
    "BucketRegionError",
];

/// The only call whose region errors are reported as a region mismatch
pub const GET_VERSIONING_OPERATION: &str = "GetBucketVersioning";

const NOT_FOUND_CODES: &[&str] = &["NotFound", "NoSuchBucket"];

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("{operation} failed with {status:?} {code:?}: {message}")]
    Service {
        operation: &'static str,
        bucket: Option<String>,
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },

    #[error("{operation} failed before a response was received: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to build request: {0}")]
    Build(#[from] aws_sdk_s3::error::BuildError),

    #[error("Invalid {field} in {operation} response")]
    InvalidResponse {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Invalid value from provider: {0}")]
    Validation(#[from] ValidationError),
}

impl StoreError {
    /// Capture an SDK failure together with the code and status the classification needs
    pub fn from_sdk<E>(
        operation: &'static str,
        bucket: Option<&str>,
        err: SdkError<E, HttpResponse>,
    ) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        match &err {
            SdkError::ServiceError(_) | SdkError::ResponseError(_) => StoreError::Service {
                operation,
                bucket: bucket.map(str::to_string),
                code: err.code().map(str::to_string),
                status: err.raw_response().map(|r| r.status().as_u16()),
                message: DisplayErrorContext(&err).to_string(),
            },
            _ => StoreError::Transport {
                operation,
                message: DisplayErrorContext(&err).to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::Service { code, status, .. } => {
                code.as_deref().map_or(false, |c| NOT_FOUND_CODES.contains(&c))
                    || *status == Some(404)
            }
            _ => false,
        }
    }

    /// Region errors only count as a mismatch on the versioning status call
    pub fn is_region_mismatch(&self) -> bool {
        match self {
            StoreError::Service {
                operation,
                code,
                status,
                ..
            } if *operation == GET_VERSIONING_OPERATION => {
                code.as_deref()
                    .map_or(false, |c| REGION_MISMATCH_CODES.contains(&c))
                    || *status == Some(301)
            }
            _ => false,
        }
    }

    fn operation(&self) -> &'static str {
        match self {
            StoreError::Service { operation, .. }
            | StoreError::Transport { operation, .. }
            | StoreError::InvalidResponse { operation, .. } => operation,
            StoreError::Build(_) => "BuildRequest",
            StoreError::Validation(_) => "Validate",
        }
    }
}

/// Convert infrastructure StoreError to domain StorageError
impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        let bucket = match &err {
            StoreError::Service { bucket, .. } => bucket.clone(),
            _ => None,
        };

        match (bucket, &err) {
            (Some(bucket), e) if e.is_not_found() => StorageError::BucketNotFound { bucket },
            (Some(bucket), e) if e.is_region_mismatch() => StorageError::RegionMismatch {
                bucket,
                message: err.to_string(),
            },
            (_, StoreError::Validation(v)) => StorageError::Validation {
                message: v.to_string(),
            },
            _ => StorageError::RemoteCall {
                operation: err.operation().to_string(),
                message: err.to_string(),
            },
        }
    }
}
