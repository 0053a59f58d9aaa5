use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::headers::Headers;
use super::progress::Progress;
use crate::error::Result;

/// Transport-ready parameters for a single request hop.
///
/// Built fresh for every logical call and cloned, with the target rewritten,
/// for every redirect hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOptions {
    /// URL scheme without the trailing colon, e.g. `https`.
    pub protocol: String,
    pub hostname: String,
    /// Explicit port only; `None` means the scheme default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port:     Option<u16>,
    /// Path plus query string.
    pub path:     String,
    pub method:   String,
    pub headers:  Headers,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            protocol: "https".to_string(),
            hostname: String::new(),
            port:     None,
            path:     "/".to_string(),
            method:   "GET".to_string(),
            headers:  Headers::new(),
        }
    }
}

impl RequestOptions {
    /// Parses `url` and applies the default headers.
    ///
    /// # Examples
    ///
    /// ```
    /// use updraft_fetch::RequestOptions;
    ///
    /// let options = RequestOptions::from_url("https://api.example.com:8443/releases?per_page=1").unwrap();
    /// assert_eq!(options.hostname, "api.example.com");
    /// assert_eq!(options.port, Some(8443));
    /// assert_eq!(options.path, "/releases?per_page=1");
    /// assert_eq!(options.headers.get("cache-control"), Some("no-cache"));
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        crate::core::configure_request_options_from_url(url, Self::default())
    }

    /// Reassembles the absolute URL this hop targets.
    pub fn url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.protocol, self.hostname, port, self.path),
            None => format!("{}://{}{}", self.protocol, self.hostname, self.path),
        }
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Caller options for a download.
///
/// # Examples
///
/// ```
/// use updraft_fetch::{DownloadOptions, Progress};
/// use std::sync::Arc;
///
/// let options = DownloadOptions::default()
///     .sha512("e3b0c44298fc1c149afbf4c8996fb924")
///     .header("Authorization", "token abc")
///     .on_progress(Arc::new(|progress: &Progress| {
///         println!("{:.1}%", progress.percent);
///     }));
/// ```
#[derive(Clone, Default)]
pub struct DownloadOptions {
    /// Header overrides merged over the defaults.
    pub headers: Option<Headers>,

    /// Expected sha256, lowercase hex. Also checked against an
    /// `X-Checksum-Sha2` response header before anything is written.
    pub sha2: Option<String>,

    /// Expected sha512, hex or base64. Preferred over `sha2` for the
    /// streamed digest check.
    pub sha512: Option<String>,

    /// Invoked with progress reports while a file download streams.
    /// Only used when the response declares its content length.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,

    pub cancellation_token: CancellationToken,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("headers", &self.headers)
            .field("sha2", &self.sha2)
            .field("sha512", &self.sha512)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .finish()
    }
}

impl DownloadOptions {
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    #[must_use]
    pub fn sha2(mut self, sha2: impl Into<String>) -> Self {
        self.sha2 = Some(sha2.into());
        self
    }

    #[must_use]
    pub fn sha512(mut self, sha512: impl Into<String>) -> Self {
        self.sha512 = Some(sha512.into());
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }
}
