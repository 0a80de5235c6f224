//! Storage collaborators for bucketgate.
//!
//! The gateway only ever reads objects. Every backend implements
//! [`ObjectFetcher`], which returns a [`RemoteObject`] (metadata plus a byte
//! stream) or a tagged [`FetchError`]:
//!
//! - [`S3ObjectFetcher`]: any S3-compatible service via `aws-sdk-s3`.
//! - [`LocalObjectFetcher`]: buckets are directories under a root path.
//! - [`InMemoryObjectFetcher`]: a concurrent map, for tests and embedding.
//!
//! # Architecture
//!
//! ```text
//! BucketProxyService
//!   -> ObjectFetcher::fetch_object(bucket, key)
//!     -> Ok(RemoteObject { content_type, size, last_modified, body })
//!     -> Err(FetchError::NotFound { .. })   => 404
//!     -> Err(FetchError::Other(..))         => 500
//! ```

mod error;
mod fetcher;
pub mod local;
pub mod memory;
mod object;
pub mod s3;

pub use error::FetchError;
pub use fetcher::{ObjectFetcher, SharedFetcher};
pub use local::LocalObjectFetcher;
pub use memory::InMemoryObjectFetcher;
pub use object::{ObjectStream, RemoteObject};
pub use s3::{S3ObjectFetcher, S3Settings};
