//! HTTP layer for bucketgate.
//!
//! - **Service** ([`service`]): [`BucketProxyService`](service::BucketProxyService)
//!   maps a request to a bucket object and produces the response, or nothing
//!   when no alias matches.
//! - **Response** ([`response`]): header projection and the fixed 404/500
//!   responses.
//! - **Body** ([`body`]): [`ProxyResponseBody`](body::ProxyResponseBody),
//!   buffered, streaming, or empty.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> BucketProxyService::handle
//!     -> percent-decode path
//!     -> AliasRouter::route            (no match => None)
//!     -> ObjectFetcher::fetch_object
//!     -> object_response / not_found_response / internal_error_response
//!   <- HTTP Response (object bytes streamed)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bucketgate_core::{AliasRouter, AliasTable};
//! use bucketgate_http::BucketProxyService;
//! use bucketgate_storage::InMemoryObjectFetcher;
//!
//! let table = AliasTable::new([("static", "my-bucket")]).unwrap();
//! let service = BucketProxyService::new(
//!     AliasRouter::new(table, Some("index.html".to_owned())),
//!     Arc::new(InMemoryObjectFetcher::new()),
//! );
//! // Call `service.handle(&request)` from a hyper service.
//! ```

pub mod body;
pub mod response;
pub mod service;

pub use body::ProxyResponseBody;
pub use service::BucketProxyService;
