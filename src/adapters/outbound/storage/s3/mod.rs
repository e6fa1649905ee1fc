//! S3 storage adapter implementation using the AWS SDK
//!
//! This module provides the S3 client configuration and the adapter that
//! implements the VersionedBucketStore port.

pub mod s3_bucket_store;

pub use s3_bucket_store::S3BucketStore;

use aws_config::{retry::RetryConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::Client;

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Configuration for S3 storage backend
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct S3Config {
    #[builder(into, default = DEFAULT_REGION.to_string())]
    pub region: String,
    #[builder(into)]
    pub endpoint: Option<String>,
    #[builder(default)]
    pub disable_ssl: bool,
    #[builder(into)]
    pub access_key: Option<String>,
    #[builder(into)]
    pub secret_key: Option<String>,
}

impl S3Config {
    /// Endpoint override with the scheme implied by `disable_ssl`
    pub fn endpoint_url(&self) -> Option<String> {
        let endpoint = self.endpoint.as_deref().filter(|e| !e.is_empty())?;
        let (scheme, host) = match endpoint.split_once("://") {
            Some((scheme, host)) => (scheme, host),
            None => ("https", endpoint),
        };
        let scheme = if self.disable_ssl { "http" } else { scheme };
        Some(format!("{}://{}", scheme, host))
    }

    fn effective_region(&self) -> String {
        if self.region.is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            self.region.clone()
        }
    }
}

/// Create an S3 client from configuration.
///
/// Retries are disabled: a single failed call ends the run.
pub async fn create_s3_client(config: &S3Config) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.effective_region()))
        .retry_config(RetryConfig::disabled());

    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "s3-version-pruner",
        ));
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true);

    if let Some(endpoint) = config.endpoint_url() {
        builder = builder.endpoint_url(endpoint);
    }

    Client::from_conf(builder.build())
}
