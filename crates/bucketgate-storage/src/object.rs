//! The fetched object type.

use std::fmt;
use std::io;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};

/// Byte stream of an object's content.
pub type ObjectStream = BoxStream<'static, io::Result<Bytes>>;

/// An object returned by a storage collaborator.
///
/// The body is consumed exactly once, when it is copied into the response.
pub struct RemoteObject {
    /// MIME type reported by the store.
    pub content_type: String,
    /// Size of the content in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// The content.
    pub body: ObjectStream,
}

impl RemoteObject {
    /// Build an object whose content is already in memory.
    #[must_use]
    pub fn from_bytes(
        content_type: impl Into<String>,
        last_modified: DateTime<Utc>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            content_type: content_type.into(),
            size: data.len() as u64,
            last_modified,
            body: stream::once(async move { Ok(data) }).boxed(),
        }
    }
}

impl fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteObject")
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}
