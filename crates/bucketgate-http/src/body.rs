//! Response body type supporting buffered, streaming, and empty modes.
//!
//! - **Buffered**: small fixed responses (404/500 text, health JSON).
//! - **Streaming**: object content copied chunk by chunk from the store.
//! - **Empty**: responses with no content.
//!
//! A streaming body that fails part way logs the failure and yields the
//! error to hyper, which then aborts that one connection. Headers have
//! already been sent at that point, so the status cannot change.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bucketgate_storage::ObjectStream;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::Full;
use tracing::error;

/// Object content being copied into a response.
pub struct StreamingBody {
    stream: ObjectStream,
    remaining: u64,
    request_id: String,
    object: String,
}

impl fmt::Debug for StreamingBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingBody")
            .field("remaining", &self.remaining)
            .field("request_id", &self.request_id)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}

/// Gateway response body.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper responses.
#[derive(Debug, Default)]
pub enum ProxyResponseBody {
    /// Buffered body for small responses.
    Buffered(Full<Bytes>),
    /// Object content streamed from storage.
    Streaming(StreamingBody),
    /// Empty body.
    #[default]
    Empty,
}

impl ProxyResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a streaming body of `size` bytes.
    ///
    /// `request_id` and `object` only label the error log emitted if the
    /// stream fails.
    #[must_use]
    pub fn streaming(
        stream: ObjectStream,
        size: u64,
        request_id: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self::Streaming(StreamingBody {
            stream,
            remaining: size,
            request_id: request_id.into(),
            object: object.into(),
        })
    }
}

impl http_body::Body for ProxyResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(body) => match body.stream.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    body.remaining = body.remaining.saturating_sub(chunk.len() as u64);
                    Poll::Ready(Some(Ok(http_body::Frame::data(chunk))))
                }
                Poll::Ready(Some(Err(e))) => {
                    error!(
                        request_id = %body.request_id,
                        object = %body.object,
                        remaining = body.remaining,
                        error = %e,
                        "object stream failed after headers were sent, aborting response"
                    );
                    Poll::Ready(Some(Err(e)))
                }
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(_) => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(body) => http_body::SizeHint::with_exact(body.remaining),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
