use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;

use super::transport::{Body, Response, Transport};
use crate::data::{Headers, RequestOptions};
use crate::error::TransportError;

/// Production transport using `reqwest`.
///
/// The client is built with redirects disabled so every hop goes back
/// through the executor.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(map_error)?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client. It must not follow redirects.
    pub fn with_client(client: reqwest::Client) -> Self { Self { client } }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        options: &RequestOptions,
        body: Option<Bytes>,
    ) -> Result<Response, TransportError> {
        let method = reqwest::Method::from_bytes(options.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let mut request = self.client.request(method, options.url());
        for (name, value) in options.headers.iter() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(map_error)?;
        let status = response.status();
        let headers = normalize_headers(response.headers());
        let stream = response.bytes_stream().map(|chunk| chunk.map_err(map_error));

        Ok(Response::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            Body::new(stream),
        ))
    }
}

/// Collapses repeated headers to their last value.
///
/// Values outside visible ASCII are decoded as lossy UTF-8 rather than
/// dropped, so a raw UTF-8 `Location` still redirects.
fn normalize_headers(map: &HeaderMap) -> Headers {
    map.keys()
        .filter_map(|name| {
            let value = map.get_all(name).iter().last()?;
            Some((name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        })
        .collect()
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_body() || e.is_decode() {
        TransportError::Aborted
    } else {
        TransportError::Other(e.to_string())
    }
}
