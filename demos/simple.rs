use s3_version_pruner::prelude::*;
use s3_version_pruner::VersioningStatus;
use std::error::Error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Seed an in-memory store with a versioned bucket
    let store = InMemoryBucketStore::new();
    let bucket = BucketName::new("demo-bucket".to_string())?;
    store.create_bucket(&bucket, VersioningStatus::Enabled).await;
    for size in [1_000, 2_000, 4_000, 8_000] {
        store.put_version(&bucket, "reports/daily.csv", size).await?;
    }
    store.put_version(&bucket, "reports/weekly.csv", 500).await?;

    let request = PruneRequest::dry_run(BucketTarget::All, RetentionPolicy::keep_latest(2));

    // Dry run first: report only
    let app = create_in_memory_app(store.clone(), request.clone()).await?;
    let plan = app.run().await?;
    println!("{}", serde_json::to_string_pretty(&plan)?);

    // Then delete for real
    let app = create_in_memory_app(store.clone(), request.confirmed()).await?;
    let report = app.run().await?;
    println!(
        "deleted {} versions, {} left for reports/daily.csv",
        report.versions_deleted(),
        store
            .remaining_versions(&bucket, "reports/daily.csv")
            .await
            .len()
    );

    Ok(())
}
