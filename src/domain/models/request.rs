use crate::domain::models::{bucket::BucketTarget, retention::RetentionPolicy};

/// Everything a pruning run needs to know besides the storage client
#[derive(Debug, Clone, PartialEq)]
pub struct PruneRequest {
    pub target: BucketTarget,
    /// Only keys starting with this prefix are listed
    pub prefix: Option<String>,
    pub policy: RetentionPolicy,
    /// `false` reports the plan without deleting anything
    pub confirm: bool,
}

impl PruneRequest {
    pub fn dry_run(target: BucketTarget, policy: RetentionPolicy) -> Self {
        Self {
            target,
            prefix: None,
            policy,
            confirm: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }

    /// Prefix as shown in log lines; empty when listing the whole bucket
    pub fn prefix_display(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }
}
