use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, stream};

use crate::data::{Headers, RequestOptions};
use crate::error::{Error, Result, TransportError};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Issues a single request hop.
///
/// Implementations must not follow redirects themselves: the executor
/// inspects every `Location` hop to decide which credentials travel with it.
/// Repeated response headers are collapsed to their last value before they
/// reach the executor.
///
/// # Implementations
///
/// - [`ReqwestTransport`](crate::ReqwestTransport): production transport built on `reqwest`
/// - In-process mocks for testing
pub trait Transport: Send + Sync {
    /// Send `options` with an optional request body and resolve once the
    /// response head has arrived. The body is streamed lazily through
    /// [`Response::body`].
    fn send(
        &self,
        options: &RequestOptions,
        body: Option<Bytes>,
    ) -> impl Future<Output = std::result::Result<Response, TransportError>> + Send;
}

/// Response head plus a lazily consumed body.
#[derive(Debug)]
pub struct Response {
    pub status:         u16,
    pub status_message: String,
    pub headers:        Headers,
    pub body:           Body,
}

impl Response {
    pub fn new(
        status: u16,
        status_message: impl Into<String>,
        headers: Headers,
        body: Body,
    ) -> Self {
        Self {
            status,
            status_message: status_message.into(),
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> { self.headers.get(name) }

    pub(crate) fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.body.idle_timeout = Some(idle_timeout);
        self
    }
}

/// Response body as a chunk stream.
///
/// Chunks are pulled one at a time, so a slow consumer throttles the
/// connection instead of queueing data in memory.
pub struct Body {
    stream:       BoxStream<'static, std::result::Result<Bytes, TransportError>>,
    idle_timeout: Option<Duration>,
}

impl Body {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            stream:       Box::pin(stream),
            idle_timeout: None,
        }
    }

    pub fn empty() -> Self { Self::new(stream::empty()) }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(stream::iter((!bytes.is_empty()).then_some(Ok(bytes))))
    }

    /// Next chunk, or `None` at end of stream.
    ///
    /// Fails with [`Error::Timeout`] when the connection stays silent longer
    /// than the executor's inactivity timeout.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        let next = self.stream.next();
        let item = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, next).await.map_err(|_| {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "response body stalled");
                Error::Timeout
            })?,
            None => next.await,
        };
        item.transpose().map_err(Error::from)
    }

    /// Reads the remaining body as UTF-8 text, replacing invalid sequences.
    pub async fn text(&mut self) -> Result<String> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("stream", &"{ ... }")
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
