//! The alias proxy service.
//!
//! [`BucketProxyService`] resolves a request path through the [`AliasRouter`],
//! fetches the object from the configured [`ObjectFetcher`], and turns the
//! outcome into a response:
//!
//! 1. Percent-decode the request path
//! 2. Route it (no alias matched => `None`, the caller falls through)
//! 3. Fetch `(bucket, key)` once; there are no retries and no second alias
//! 4. `NotFound` => 404, other errors => 500, success => streamed object
//!
//! The request method is not inspected.
//!
//! [`ObjectFetcher`]: bucketgate_storage::ObjectFetcher

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bucketgate_core::AliasRouter;
use bucketgate_storage::{FetchError, SharedFetcher};
use http::{Method, Request, Response};
use percent_encoding::percent_decode_str;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::body::ProxyResponseBody;
use crate::response::{internal_error_response, not_found_response, object_response};

/// Serves bucket objects for aliased request paths.
#[derive(Clone)]
pub struct BucketProxyService {
    router: Arc<AliasRouter>,
    fetcher: SharedFetcher,
}

impl fmt::Debug for BucketProxyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketProxyService")
            .field("router", &self.router)
            .field("fetcher", &self.fetcher.name())
            .finish()
    }
}

impl BucketProxyService {
    /// Create a service from a router and a storage collaborator.
    #[must_use]
    pub fn new(router: AliasRouter, fetcher: SharedFetcher) -> Self {
        Self {
            router: Arc::new(router),
            fetcher,
        }
    }

    /// The alias router.
    #[must_use]
    pub fn router(&self) -> &AliasRouter {
        &self.router
    }

    /// Handle a request.
    ///
    /// Resolves to `None` when no alias matches, leaving the response to the
    /// caller's default handling.
    pub fn handle<B>(
        &self,
        req: &Request<B>,
    ) -> impl Future<Output = Option<Response<ProxyResponseBody>>> + Send + 'static + use<B> {
        let method = req.method().clone();
        let path = decode_path(req.uri().path()).into_owned();
        let this = self.clone();
        async move { this.serve_path(&method, &path).await }
    }

    /// Serve an already-decoded request path.
    pub async fn serve_path(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<Response<ProxyResponseBody>> {
        let route = self.router.route(path)?;
        let request_id = Uuid::new_v4().to_string();

        info!(
            request_id = %request_id,
            %method,
            path,
            alias = route.alias,
            bucket = route.bucket,
            key = %route.key,
            "fetching object"
        );

        let response = match self.fetcher.fetch_object(route.bucket, &route.key).await {
            Ok(object) => object_response(object, &request_id, &route.to_string()),
            Err(err @ FetchError::NotFound { .. }) => {
                debug!(request_id = %request_id, error = %err, "object not found");
                not_found_response()
            }
            Err(err @ FetchError::Other(_)) => {
                error!(
                    request_id = %request_id,
                    backend = self.fetcher.name(),
                    bucket = route.bucket,
                    key = %route.key,
                    error = %err,
                    "object fetch failed"
                );
                internal_error_response()
            }
        };

        Some(response)
    }
}

/// Percent-decode a URI path. Invalid UTF-8 is replaced, not rejected.
#[must_use]
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}
