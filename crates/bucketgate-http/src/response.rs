//! Response builders.
//!
//! Object responses carry exactly three headers projected from the object
//! metadata: `Content-Type`, `Content-Length`, and `Last-Modified`. Error
//! responses use fixed plain-text bodies and never include upstream error
//! text.

use bucketgate_storage::RemoteObject;
use chrono::{DateTime, Utc};
use http::header::{self, HeaderValue};
use http::{Response, StatusCode};
use tracing::warn;

use crate::body::ProxyResponseBody;

/// Body of every 404 response.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Body of every 500 response.
pub const INTERNAL_ERROR_BODY: &str = "An internal error has occurred\n";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Format a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
#[must_use]
pub fn http_date(ts: &DateTime<Utc>) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the success response for a fetched object.
///
/// `request_id` and `object` label the log line emitted if streaming fails.
#[must_use]
pub fn object_response(
    object: RemoteObject,
    request_id: &str,
    label: &str,
) -> Response<ProxyResponseBody> {
    let RemoteObject {
        content_type,
        size,
        last_modified,
        body,
    } = object;

    let mut response = Response::new(ProxyResponseBody::streaming(body, size, request_id, label));
    let headers = response.headers_mut();

    let content_type = HeaderValue::from_str(&content_type).unwrap_or_else(|_| {
        warn!(
            request_id,
            object = label,
            content_type = %content_type,
            "object has a content type that is not a valid header value"
        );
        HeaderValue::from_static("application/octet-stream")
    });
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    if let Ok(hv) = HeaderValue::from_str(&http_date(&last_modified)) {
        headers.insert(header::LAST_MODIFIED, hv);
    }

    response
}

/// Produce a 404 response.
#[must_use]
pub fn not_found_response() -> Response<ProxyResponseBody> {
    text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Produce a 500 response with the generic message.
#[must_use]
pub fn internal_error_response() -> Response<ProxyResponseBody> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY)
}

fn text_response(status: StatusCode, body: &'static str) -> Response<ProxyResponseBody> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, TEXT_PLAIN)
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(ProxyResponseBody::from_string(body))
        .expect("static text response should be valid")
}
