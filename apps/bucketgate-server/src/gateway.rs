//! Gateway service in front of the bucket proxy.
//!
//! The health-check endpoint (`GET /_health`) is intercepted here. Every other
//! request goes to the [`BucketProxyService`]; when no alias matches, the
//! gateway answers with the default 404.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bucketgate_http::BucketProxyService;
use bucketgate_http::ProxyResponseBody;
use bucketgate_http::response::not_found_response;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::debug;

/// Path answered by the gateway itself.
pub const HEALTH_PATH: &str = "/_health";

type ResponseFuture = Pin<Box<dyn Future<Output = http::Response<ProxyResponseBody>> + Send>>;

/// Hyper service for the whole server.
#[derive(Debug, Clone)]
pub struct GatewayService {
    proxy: BucketProxyService,
}

impl GatewayService {
    /// Create a gateway around a proxy service.
    #[must_use]
    pub fn new(proxy: BucketProxyService) -> Self {
        Self { proxy }
    }

    fn respond<B>(&self, req: &http::Request<B>) -> ResponseFuture {
        if is_health_check(req.method(), req.uri().path()) {
            return Box::pin(async { health_check_response() });
        }

        let path = req.uri().path().to_owned();
        let proxied = self.proxy.handle(req);
        Box::pin(async move {
            proxied.await.unwrap_or_else(|| {
                debug!(path = %path, "no alias matched, using default handler");
                not_found_response()
            })
        })
    }
}

impl Service<http::Request<Incoming>> for GatewayService {
    type Response = http::Response<ProxyResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let resp = self.respond(&req);
        Box::pin(async move { Ok(resp.await) })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == HEALTH_PATH
}

fn health_check_response() -> http::Response<ProxyResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(ProxyResponseBody::from_string(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bucketgate_core::{AliasRouter, AliasTable};
    use bucketgate_http::response::NOT_FOUND_BODY;
    use bucketgate_storage::InMemoryObjectFetcher;
    use http_body_util::BodyExt;

    use super::*;

    fn gateway() -> GatewayService {
        let table = AliasTable::new([("static", "assets")]).expect("valid table");
        let fetcher = Arc::new(InMemoryObjectFetcher::new());
        fetcher.put("assets", "app.js", "text/javascript", "console.log(1)");
        GatewayService::new(BucketProxyService::new(
            AliasRouter::new(table, None),
            fetcher,
        ))
    }

    fn request(method: http::Method, uri: &str) -> http::Request<()> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .expect("valid request")
    }

    async fn body_string(resp: http::Response<ProxyResponseBody>) -> String {
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[test]
    fn test_should_detect_health_check_path() {
        assert!(is_health_check(&http::Method::GET, "/_health"));
        assert!(!is_health_check(&http::Method::POST, "/_health"));
        assert!(!is_health_check(&http::Method::GET, "/static/_health"));
    }

    #[tokio::test]
    async fn test_should_answer_health_check() {
        let resp = gateway().respond(&request(http::Method::GET, "/_health")).await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(
            resp.headers()["content-type"],
            "application/json"
        );
        assert_eq!(body_string(resp).await, r#"{"status":"running"}"#);
    }

    #[tokio::test]
    async fn test_should_proxy_aliased_path() {
        let resp = gateway()
            .respond(&request(http::Method::GET, "/static/app.js"))
            .await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/javascript");
        assert_eq!(body_string(resp).await, "console.log(1)");
    }

    #[test]
    fn test_should_fall_back_to_not_found_for_unknown_alias() {
        let resp =
            tokio_test::block_on(gateway().respond(&request(http::Method::GET, "/unknown/app.js")));
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        let body = tokio_test::block_on(body_string(resp));
        assert_eq!(body, NOT_FOUND_BODY);
    }
}
