//! Integration tests for the bucketgate server.
//!
//! These tests need two running processes:
//!
//! - an S3-compatible store at `S3_ENDPOINT_URL` (default `http://localhost:4566`)
//! - a bucketgate server at `GATEWAY_URL` (default `http://localhost:8080`)
//!   configured with `BUCKET_ALIASES=static=bucketgate-it`,
//!   `ALIAS_INDEX_HTML=true`, and the same storage endpoint.
//!
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketgate-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL of the backing object store.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Base URL of the gateway under test.
#[must_use]
pub fn gateway_url() -> String {
    std::env::var("GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Alias the gateway maps to [`test_bucket`].
#[must_use]
pub fn test_alias() -> String {
    std::env::var("GATEWAY_TEST_ALIAS").unwrap_or_else(|_| "static".to_owned())
}

/// Bucket behind [`test_alias`].
#[must_use]
pub fn test_bucket() -> String {
    std::env::var("GATEWAY_TEST_BUCKET").unwrap_or_else(|_| "bucketgate-it".to_owned())
}

/// Create a configured S3 client pointing at the backing store.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique key prefix so tests don't collide in the shared bucket.
#[must_use]
pub fn test_prefix(name: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("it-{name}-{id}")
}

/// Create the test bucket if it does not exist yet.
pub async fn ensure_test_bucket(client: &aws_sdk_s3::Client) -> String {
    let bucket = test_bucket();
    if client.head_bucket().bucket(&bucket).send().await.is_err() {
        tracing::info!(bucket = %bucket, "creating integration test bucket");
        client
            .create_bucket()
            .bucket(&bucket)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create bucket {bucket}: {e}"));
    }
    bucket
}

/// Upload an object.
pub async fn put_object(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    body: &'static [u8],
) {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from_static(body))
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to put {bucket}/{key}: {e}"));
}

/// Delete the given keys, ignoring failures.
pub async fn cleanup_objects(client: &aws_sdk_s3::Client, bucket: &str, keys: &[String]) {
    for key in keys {
        let _ = client.delete_object().bucket(bucket).key(key).send().await;
    }
}

mod test_proxy;
