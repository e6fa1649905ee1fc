mod versioned_bucket_store;

pub use versioned_bucket_store::{
    ListVersionsRequest, VersionedBucketStore, MAX_DELETE_BATCH_SIZE, MAX_LIST_PAGE_SIZE,
};
