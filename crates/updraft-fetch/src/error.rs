//! Error types for updraft-fetch.

use std::borrow::Borrow;
use std::io;

use serde_json::Value;
use thiserror::Error;
use updraft_verify::VerificationError;

use crate::core::{safe_stringify_json, status_reason};
use crate::data::Headers;

/// A non-success HTTP status surfaced by [`HttpExecutor::request`].
///
/// [`HttpExecutor::request`]: crate::HttpExecutor::request
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status_code: u16,
    pub message:     String,
    /// Parsed JSON body, raw body text, or a hint composed by the executor.
    pub description: Option<Value>,
    /// `HTTP_ERROR_<status>`
    pub code:        String,
}

impl HttpError {
    /// Error with the short reason for `status_code`, e.g.
    /// `HTTP error: Too many requests`.
    pub fn new(status_code: u16) -> Self {
        let message = match status_reason(status_code) {
            Some(reason) => format!("HTTP error: {reason}"),
            None => format!("HTTP error: {status_code}"),
        };
        Self::with_message(status_code, message, None)
    }

    pub fn with_message(
        status_code: u16,
        message: impl Into<String>,
        description: Option<Value>,
    ) -> Self {
        Self {
            status_code,
            message: message.into(),
            description,
            code: format!("HTTP_ERROR_{status_code}"),
        }
    }

    /// Composes the message from the status line, the pretty-printed
    /// description and the response headers with secrets stripped.
    pub fn from_response(
        status_code: u16,
        status_message: &str,
        headers: &Headers,
        description: Option<Value>,
    ) -> Self {
        let mut message = format!("{status_code} {status_message}");
        if let Some(description) = &description {
            message.push('\n');
            message.push_str(
                &serde_json::to_string_pretty(description)
                    .unwrap_or_else(|_| description.to_string()),
            );
        }
        message.push_str("\nHeaders: ");
        message.push_str(&safe_stringify_json(headers));
        Self::with_message(status_code, message, description)
    }
}

/// Failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("Request has been aborted by the server")]
    Aborted,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Cannot download \"{url}\", status {status}: {status_message}")]
    DownloadStatus {
        url:            String,
        status:         u16,
        status_message: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Request timed out")]
    Timeout,

    #[error("Too many redirects (> {max})")]
    TooManyRedirects { max: u32 },

    #[error("Maximum allowed size is {} MB", megabytes(.limit))]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Received data length {received} is not equal to expected {expected}")]
    LengthMismatch { received: u64, expected: u64 },

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("checksum mismatch: expected {expected} but got {actual} (X-Checksum-Sha2 header)")]
    ChecksumHeaderMismatch { expected: String, actual: String },

    #[error("cancelled")]
    Cancelled,

    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url:    String,
        #[source]
        source: url::ParseError,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Machine-readable code for the failure.
    pub fn code(&self) -> &str {
        match self {
            Error::Http(e) => &e.code,
            Error::DownloadStatus { .. } => "ERR_DOWNLOAD_STATUS",
            Error::Transport(TransportError::Aborted) => "ERR_ABORTED",
            Error::Transport(_) => "ERR_TRANSPORT",
            Error::Timeout => "ERR_TIMEOUT",
            Error::TooManyRedirects { .. } => "ERR_TOO_MANY_REDIRECTS",
            Error::PayloadTooLarge { .. } => "ERR_PAYLOAD_TOO_LARGE",
            Error::LengthMismatch { .. } => "ERR_LENGTH_MISMATCH",
            Error::Verification(e) => e.code(),
            Error::ChecksumHeaderMismatch { .. } => "ERR_CHECKSUM_MISMATCH",
            Error::Cancelled => "ERR_CANCELLED",
            Error::InvalidUrl { .. } => "ERR_INVALID_URL",
            Error::Json(_) => "ERR_JSON",
            Error::Io(_) => "ERR_IO",
        }
    }

    /// HTTP status behind the failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http(e) => Some(e.status_code),
            Error::DownloadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool { matches!(self, Error::Cancelled) }
}

pub type Result<T> = std::result::Result<T, Error>;

fn megabytes(bytes: impl Borrow<u64>) -> u64 { bytes.borrow() / (1024 * 1024) }
