mod batch_purger;
mod bucket_selector;
mod pruning_service_impl;
mod retention_evaluator;
mod version_enumerator;

pub use batch_purger::BatchPurger;
pub use bucket_selector::BucketSelector;
pub use pruning_service_impl::PruningServiceImpl;
pub use retention_evaluator::RetentionEvaluator;
pub use version_enumerator::{Enumeration, VersionEnumerator};
