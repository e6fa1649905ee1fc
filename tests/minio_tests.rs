use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketVersioningStatus, VersioningConfiguration};
use s3_version_pruner::{
    adapters::outbound::storage::s3::create_s3_client, create_s3_app, BucketName, BucketTarget,
    PruneRequest, RetentionPolicy, S3Config,
};

// Note: These tests require MinIO to be running and configured via environment variables:
// - MINIO_ENDPOINT (default: http://localhost:9000)
// - MINIO_ACCESS_KEY_ID (default: minioadmin)
// - MINIO_SECRET_ACCESS_KEY (default: minioadmin)
// - MINIO_BUCKET (default: pruner-test-bucket)

fn minio_config() -> (S3Config, String) {
    let endpoint =
        std::env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());
    let access_key =
        std::env::var("MINIO_ACCESS_KEY_ID").unwrap_or_else(|_| "minioadmin".to_string());
    let secret_key =
        std::env::var("MINIO_SECRET_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
    let bucket = std::env::var("MINIO_BUCKET").unwrap_or_else(|_| "pruner-test-bucket".to_string());

    let config = S3Config::builder()
        .region("us-east-1")
        .endpoint(endpoint)
        .disable_ssl(true)
        .access_key(access_key)
        .secret_key(secret_key)
        .build();

    (config, bucket)
}

async fn prepare_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let _ = client.create_bucket().bucket(bucket).send().await;

    client
        .put_bucket_versioning()
        .bucket(bucket)
        .versioning_configuration(
            VersioningConfiguration::builder()
                .status(BucketVersioningStatus::Enabled)
                .build(),
        )
        .send()
        .await
        .unwrap();
}

async fn count_versions(client: &aws_sdk_s3::Client, bucket: &str, key: &str) -> usize {
    let response = client
        .list_object_versions()
        .bucket(bucket)
        .prefix(key)
        .send()
        .await
        .unwrap();
    response.versions().len() + response.delete_markers().len()
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_prunes_old_versions() {
    let (config, bucket) = minio_config();
    println!("Connecting to MinIO at {:?} with bucket {}", config.endpoint, bucket);

    let client = create_s3_client(&config).await;
    prepare_bucket(&client, &bucket).await;

    let key = "pruner/minio-test.txt";
    for i in 0..4 {
        client
            .put_object()
            .bucket(&bucket)
            .key(key)
            .body(ByteStream::from(format!("revision {i}").into_bytes()))
            .send()
            .await
            .unwrap();
    }
    client
        .delete_object()
        .bucket(&bucket)
        .key(key)
        .send()
        .await
        .unwrap();
    assert!(count_versions(&client, &bucket, key).await >= 5);

    let target = BucketTarget::Named(BucketName::new(bucket.clone()).unwrap());

    // Dry run leaves everything in place
    let request = PruneRequest::dry_run(target.clone(), RetentionPolicy::keep_latest(2))
        .with_prefix("pruner/");
    let app = create_s3_app(config.clone(), request).await.unwrap();
    let report = app.run().await.unwrap();
    assert!(report.versions_to_delete() > 0);
    let before = count_versions(&client, &bucket, key).await;

    // Newest delete marker plus two live versions survive
    let request = PruneRequest::dry_run(target, RetentionPolicy::keep_latest(2))
        .with_prefix("pruner/")
        .confirmed();
    let app = create_s3_app(config, request).await.unwrap();
    let report = app.run().await.unwrap();

    assert_eq!(report.versions_deleted(), before - 3);
    assert_eq!(count_versions(&client, &bucket, key).await, 3);
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_missing_bucket() {
    let (config, _) = minio_config();

    let request = PruneRequest::dry_run(
        BucketTarget::Named(BucketName::new("no-such-pruner-bucket".to_string()).unwrap()),
        RetentionPolicy::keep_latest(1),
    );
    let app = create_s3_app(config, request).await.unwrap();

    let err = app.run().await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}
