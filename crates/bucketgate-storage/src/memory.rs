//! In-memory object fetcher.
//!
//! Objects live in a [`DashMap`] keyed by `(bucket, key)`, so the fetcher can
//! be populated while requests are being served.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::trace;

use crate::error::FetchError;
use crate::fetcher::ObjectFetcher;
use crate::object::RemoteObject;

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    last_modified: DateTime<Utc>,
    data: Bytes,
}

/// Thread-safe in-memory object store.
#[derive(Debug, Default)]
pub struct InMemoryObjectFetcher {
    objects: DashMap<(String, String), StoredObject>,
}

impl InMemoryObjectFetcher {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, stamped with the current time.
    pub fn put(
        &self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) {
        self.put_with_modified(bucket, key, content_type, Utc::now(), data);
    }

    /// Store an object with an explicit modification time.
    pub fn put_with_modified(
        &self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        content_type: impl Into<String>,
        last_modified: DateTime<Utc>,
        data: impl Into<Bytes>,
    ) {
        self.objects.insert(
            (bucket.into(), key.into()),
            StoredObject {
                content_type: content_type.into(),
                last_modified,
                data: data.into(),
            },
        );
    }

    /// Remove an object, returning whether it existed.
    pub fn remove(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .remove(&(bucket.to_owned(), key.to_owned()))
            .is_some()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectFetcher for InMemoryObjectFetcher {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<RemoteObject, FetchError> {
        let stored = self
            .objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FetchError::not_found(bucket, key))?;

        trace!(bucket, key, size = stored.data.len(), "serving in-memory object");
        Ok(RemoteObject::from_bytes(
            stored.content_type,
            stored.last_modified,
            stored.data,
        ))
    }
}
