use crate::domain::{errors::ValidationError, value_objects::BucketName};
use std::str::FromStr;

/// Which buckets a pruning run should consider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketTarget {
    /// Every bucket in the account
    All,
    /// A single bucket that must exist
    Named(BucketName),
}

impl BucketTarget {
    /// Literal used on the command line for "all buckets"
    pub const WILDCARD: &'static str = "*";
}

impl FromStr for BucketTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::WILDCARD {
            return Ok(BucketTarget::All);
        }
        BucketName::new(s.to_string()).map(BucketTarget::Named)
    }
}

impl std::fmt::Display for BucketTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketTarget::All => write!(f, "{}", Self::WILDCARD),
            BucketTarget::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Versioning state reported by the provider for a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningStatus {
    Enabled,
    Suspended,
    /// Versioning was never configured
    Unset,
}

impl VersioningStatus {
    pub fn is_enabled(self) -> bool {
        matches!(self, VersioningStatus::Enabled)
    }
}

/// A bucket and what the versioning probe learned about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketIdentity {
    pub name: BucketName,
    /// `None` when the bucket could not be inspected from the configured region
    pub versioning: Option<VersioningStatus>,
}

impl BucketIdentity {
    pub fn is_prunable(&self) -> bool {
        self.versioning.map_or(false, VersioningStatus::is_enabled)
    }
}
