//! Local directory object fetcher.
//!
//! Each bucket is a directory directly under the root, and object keys are
//! `/`-separated paths inside it:
//!
//! ```text
//! <root>/my-bucket/css/app.css   <=  ("my-bucket", "css/app.css")
//! ```
//!
//! Keys that would leave the bucket directory (`..`, `.`, empty segments) and
//! keys naming a directory are reported as not found. A missing bucket
//! directory is an internal error, mirroring how object stores treat an
//! unknown bucket differently from an unknown key.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::FetchError;
use crate::fetcher::ObjectFetcher;
use crate::object::RemoteObject;

/// Read size for streaming file content.
const CHUNK_SIZE: usize = 64 * 1024;

/// Serves buckets from directories under a root path.
#[derive(Debug, Clone)]
pub struct LocalObjectFetcher {
    root: PathBuf,
}

impl LocalObjectFetcher {
    /// Create a fetcher rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `(bucket, key)` to a file path, or `None` if the key is unsafe.
    fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        if !is_safe_segment(bucket) {
            return None;
        }
        let mut path = self.root.join(bucket);
        for segment in key.split('/') {
            if !is_safe_segment(segment) {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['\\', '\0'])
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[async_trait]
impl ObjectFetcher for LocalObjectFetcher {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<RemoteObject, FetchError> {
        let Some(path) = self.object_path(bucket, key) else {
            debug!(bucket, key, "rejecting key outside bucket directory");
            return Err(FetchError::not_found(bucket, key));
        };

        let bucket_dir = self.root.join(bucket);
        match tokio::fs::metadata(&bucket_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(anyhow!("bucket {bucket:?} is not a directory").into()),
            Err(e) if is_missing(&e) => {
                return Err(anyhow!("bucket {bucket:?} does not exist").into());
            }
            Err(e) => {
                return Err(anyhow!("failed to stat bucket {bucket:?}: {e}").into());
            }
        }

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if is_missing(&e) => return Err(FetchError::not_found(bucket, key)),
            Err(e) => {
                return Err(anyhow!("failed to open {}: {e}", path.display()).into());
            }
        };
        let meta = file
            .metadata()
            .await
            .map_err(|e| anyhow!("failed to stat {}: {e}", path.display()))?;
        if meta.is_dir() {
            return Err(FetchError::not_found(bucket, key));
        }

        let last_modified: DateTime<Utc> = meta
            .modified()
            .map_err(|e| anyhow!("no modification time for {}: {e}", path.display()))?
            .into();

        let body = stream::try_unfold(file, |mut file| async move {
            let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
            let n = file.read_buf(&mut buf).await?;
            Ok::<_, io::Error>((n > 0).then(|| (buf.freeze(), file)))
        })
        .boxed();

        Ok(RemoteObject {
            content_type: content_type_for(&path).to_string(),
            size: meta.len(),
            last_modified,
            body,
        })
    }
}

/// Guess a MIME type from the file extension.
fn content_type_for(path: &Path) -> mime::Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("xml") => mime::TEXT_XML,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("pdf") => mime::APPLICATION_PDF,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
