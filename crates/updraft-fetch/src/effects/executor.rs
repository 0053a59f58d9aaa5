use std::future::Future;
use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::buffer::BufferSink;
use super::file::FileSink;
use super::handler::ResponseHandler;
use super::transport::{Response, Transport};
use crate::core::{
    configure_request_options, configure_request_options_from_url, error_description,
    is_json_content_type, not_found_description, parse_json, prepare_redirect_options,
    safe_stringify_json,
};
use crate::data::{DownloadOptions, ExecutorConfig, RequestOptions};
use crate::error::{Error, HttpError, Result};

/// Rewrites the current hop's options for the target of a `Location` header.
pub type RedirectStrategy = fn(&str, &RequestOptions) -> Result<RequestOptions>;

/// Runs logical HTTP calls over a [`Transport`].
///
/// Every call makes exactly one attempt, follows up to
/// [`ExecutorConfig::max_redirects`] redirects by hand, and settles once:
/// with a value, an error, or [`Error::Cancelled`] as soon as its token
/// fires. The executor keeps no per-call state, so calls may run
/// concurrently.
///
/// # Examples
///
/// ```no_run
/// use updraft_fetch::{DownloadOptions, HttpExecutor, ReqwestTransport};
///
/// # async fn example() -> updraft_fetch::Result<()> {
/// let executor = HttpExecutor::new(ReqwestTransport::new()?);
///
/// let options = DownloadOptions::default().sha512("3a1b...");
/// let _path = executor
///     .download("https://example.com/app-1.2.0.zip", "/tmp/app.zip", &options)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpExecutor<T> {
    transport: T,
    config:    ExecutorConfig,
    redirect:  RedirectStrategy,
}

impl<T: Transport> HttpExecutor<T> {
    pub fn new(transport: T) -> Self { Self::with_config(transport, ExecutorConfig::default()) }

    pub fn with_config(transport: T, config: ExecutorConfig) -> Self {
        Self {
            transport,
            config,
            redirect: prepare_redirect_options,
        }
    }

    /// Replaces the function that builds each redirect hop.
    #[must_use]
    pub fn with_redirect_strategy(mut self, redirect: RedirectStrategy) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn config(&self) -> &ExecutorConfig { &self.config }

    pub fn transport(&self) -> &T { &self.transport }

    /// Performs an API call and resolves its body text.
    ///
    /// Resolves `None` for 204 and for empty bodies. Statuses from 400 up fail
    /// with [`HttpError`]; a 404 fails without reading the body.
    pub async fn request(
        &self,
        options: RequestOptions,
        token: &CancellationToken,
    ) -> Result<Option<String>> {
        let options = configure_request_options(options, None, None);
        guard(token, self.api_request(options, None)).await
    }

    /// Like [`request`](Self::request), sending `data` as a JSON body.
    ///
    /// A GET or HEAD method becomes POST.
    pub async fn request_with_body<D>(
        &self,
        options: RequestOptions,
        token: &CancellationToken,
        data: &D,
    ) -> Result<Option<String>>
    where
        D: Serialize + ?Sized,
    {
        let payload = Bytes::from(serde_json::to_vec(data)?);

        let mut options = configure_request_options(options, None, None);
        if options.method.eq_ignore_ascii_case("GET") || options.method.eq_ignore_ascii_case("HEAD") {
            options.method = "POST".to_string();
        }
        options.headers.insert("Content-Type", "application/json");
        options.headers.insert("Content-Length", payload.len().to_string());

        guard(token, self.api_request(options, Some(payload))).await
    }

    /// [`request`](Self::request) followed by JSON deserialization.
    pub async fn request_json<R: DeserializeOwned>(
        &self,
        options: RequestOptions,
        token: &CancellationToken,
    ) -> Result<Option<R>> {
        parse_json(self.request(options, token).await?)
    }

    /// Downloads `url` into `destination`, verifying digests on the way.
    pub async fn download(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
        options: &DownloadOptions,
    ) -> Result<PathBuf> {
        self.download_with(url, options, FileSink::new(destination)).await
    }

    /// Downloads `url` into memory, capped at
    /// [`ExecutorConfig::max_buffer_size`].
    pub async fn download_to_buffer(&self, url: &str, options: &DownloadOptions) -> Result<Bytes> {
        let sink = BufferSink::new(self.config.max_buffer_size);
        self.download_with(url, options, sink).await
    }

    /// Downloads `url` and hands the final response to `handler`.
    ///
    /// Statuses from 400 up fail before the body is read.
    pub async fn download_with<H: ResponseHandler>(
        &self,
        url: &str,
        options: &DownloadOptions,
        handler: H,
    ) -> Result<H::Output> {
        let request = RequestOptions {
            headers: options.headers.clone().unwrap_or_default(),
            ..RequestOptions::default()
        };
        let request = configure_request_options_from_url(url, request)?;

        guard(&options.cancellation_token, async {
            let response = self.open_download(request).await?;
            handler.handle(response, options).await
        })
        .await
    }

    async fn api_request(&self, mut options: RequestOptions, body: Option<Bytes>) -> Result<Option<String>> {
        let mut redirects = 0;
        loop {
            let mut response = self.send(&options, body.clone()).await?;

            match response.status {
                404 => {
                    let hint = Value::String(not_found_description(&options));
                    return Err(HttpError::from_response(
                        404,
                        &response.status_message,
                        &response.headers,
                        Some(hint),
                    )
                    .into());
                }
                204 => return Ok(None),
                _ => {}
            }

            if let Some(location) = response.header("location") {
                options = self.follow(location, &options, &mut redirects)?;
                continue;
            }

            let text = response.body.text().await?;
            if response.status >= 400 {
                let description = error_description(text, is_json_content_type(&response.headers));
                return Err(HttpError::from_response(
                    response.status,
                    &response.status_message,
                    &response.headers,
                    Some(description),
                )
                .into());
            }
            return Ok((!text.is_empty()).then_some(text));
        }
    }

    async fn open_download(&self, mut options: RequestOptions) -> Result<Response> {
        let mut redirects = 0;
        loop {
            let response = self.send(&options, None).await?;

            if response.status >= 400 {
                return Err(Error::DownloadStatus {
                    url:            options.url(),
                    status:         response.status,
                    status_message: response.status_message,
                });
            }

            match response.header("location") {
                Some(location) => options = self.follow(location, &options, &mut redirects)?,
                None => return Ok(response),
            }
        }
    }

    fn follow(&self, location: &str, options: &RequestOptions, redirects: &mut u32) -> Result<RequestOptions> {
        let max = self.config.max_redirects;
        if *redirects >= max {
            warn!(max, location, "redirect limit reached");
            return Err(Error::TooManyRedirects { max });
        }
        *redirects += 1;
        debug!(hop = *redirects, location, "following redirect");
        (self.redirect)(location, options)
    }

    /// One transport round trip with the inactivity watchdog armed on the
    /// head and on every body chunk.
    async fn send(&self, options: &RequestOptions, body: Option<Bytes>) -> Result<Response> {
        debug!(options = %safe_stringify_json(options), "request");

        let limit = self.config.inactivity_timeout;
        let response = tokio::time::timeout(limit, self.transport.send(options, body))
            .await
            .map_err(|_| {
                warn!(url = %options.url(), timeout_ms = limit.as_millis() as u64, "no response");
                Error::Timeout
            })??;

        debug!(status = response.status, status_message = %response.status_message, "response");
        Ok(response.with_idle_timeout(limit))
    }
}

/// Races `call` against `token`, dropping the in-flight call on cancellation.
async fn guard<F, R>(token: &CancellationToken, call: F) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("call cancelled");
            Err(Error::Cancelled)
        }
        outcome = call => match outcome {
            Err(_) if token.is_cancelled() => Err(Error::Cancelled),
            outcome => outcome,
        },
    }
}
