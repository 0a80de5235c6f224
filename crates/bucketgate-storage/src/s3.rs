//! S3-compatible object fetcher.
//!
//! The client is built once at startup. Credentials come from the standard
//! AWS provider chain; when a credentials file is configured it is loaded as
//! the shared-credentials profile file, so the gateway can be pointed at a
//! dedicated key without touching `~/.aws`.
//!
//! Error mapping:
//!
//! | S3 outcome | [`FetchError`] |
//! |------------|----------------|
//! | `NoSuchKey` | `NotFound` |
//! | anything else (`NoSuchBucket`, `AccessDenied`, transport) | `Other` |

use std::io;
use std::path::PathBuf;

use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::fetcher::ObjectFetcher;
use crate::object::{ObjectStream, RemoteObject};

/// Content type reported when the store has none on record.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Connection settings for [`S3ObjectFetcher::from_settings`].
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// Shared-credentials file to load instead of the default one.
    pub credentials_path: Option<PathBuf>,
    /// Custom endpoint (MinIO, LocalStack, ...).
    pub endpoint_url: Option<String>,
    /// Region to sign requests for.
    pub region: String,
    /// Use path-style addressing (`endpoint/bucket/key`).
    pub force_path_style: bool,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            credentials_path: None,
            endpoint_url: None,
            region: "us-east-1".to_owned(),
            force_path_style: false,
        }
    }
}

/// Fetches objects with `GetObject`.
#[derive(Debug, Clone)]
pub struct S3ObjectFetcher {
    client: Client,
}

impl S3ObjectFetcher {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from [`S3Settings`].
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let Some(path) = &settings.credentials_path {
            info!(path = %path.display(), "loading storage credentials file");
            let files = ProfileFiles::builder()
                .include_default_config_file(true)
                .with_file(ProfileFileKind::Credentials, path.clone())
                .build();
            loader = loader.profile_files(files);
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        Self::new(Client::from_conf(s3_config))
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectFetcher for S3ObjectFetcher {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<RemoteObject, FetchError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Err(FetchError::not_found(bucket, key));
                }
                return Err(anyhow!(
                    "GetObject {bucket}/{key} failed: {}",
                    DisplayErrorContext(&err)
                )
                .into());
            }
        };

        let size = object_size(output.content_length())?;
        let last_modified = output
            .last_modified()
            .ok_or_else(|| anyhow!("GetObject {bucket}/{key} returned no Last-Modified"))
            .and_then(to_chrono)?;
        let content_type = output
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();

        debug!(bucket, key, size, content_type = %content_type, "fetched S3 object");

        Ok(RemoteObject {
            content_type,
            size,
            last_modified,
            body: byte_stream(output.body),
        })
    }
}

fn object_size(content_length: Option<i64>) -> anyhow::Result<u64> {
    let len = content_length.ok_or_else(|| anyhow!("GetObject returned no Content-Length"))?;
    u64::try_from(len).map_err(|_| anyhow!("GetObject returned negative Content-Length {len}"))
}

fn to_chrono(ts: &SmithyDateTime) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
        .ok_or_else(|| anyhow!("Last-Modified {ts:?} is out of range"))
}

fn byte_stream(body: ByteStream) -> ObjectStream {
    stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(io::Error::other), body))
    })
    .boxed()
}
