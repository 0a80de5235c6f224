//! The storage collaborator trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::object::RemoteObject;

/// Trait every storage backend implements.
///
/// This is the boundary between the gateway and object storage. Implementors
/// must be shareable across request tasks.
#[async_trait]
pub trait ObjectFetcher: Send + Sync + 'static {
    /// Backend name for logging (e.g. `"s3"`, `"local"`).
    fn name(&self) -> &'static str;

    /// Fetch an object's metadata and content stream.
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<RemoteObject, FetchError>;
}

/// A type-erased fetcher shared between request tasks.
pub type SharedFetcher = Arc<dyn ObjectFetcher>;
