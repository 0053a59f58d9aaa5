//! Redirect-following, cancellable HTTP calls and verified downloads.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - `data` - Immutable options, limits and progress reports
//! - [`core`](crate::core) - Pure transformations: option building, redirect rewriting,
//!   response classification, secret redaction
//! - `effects` - The [`Transport`] seam and everything that performs I/O
//!
//! # Key Features
//!
//! - **Manual Redirects**: Every hop goes through [`HttpExecutor`], which drops
//!   `token` credentials on the way to cloud storage hosts
//! - **Single-Pass Verification**: Bytes are hashed while they stream to disk
//! - **Staged Placement**: A file download only replaces its destination once
//!   every check passed
//! - **Settles Once**: Each call ends with one value or one [`Error`], and a
//!   fired [`CancellationToken`] always reads as [`Error::Cancelled`]
//!
//! # Example
//!
//! ```no_run
//! use updraft_fetch::{CancellationToken, HttpExecutor, ReqwestTransport, RequestOptions};
//!
//! # async fn example() -> updraft_fetch::Result<()> {
//! let executor = HttpExecutor::new(ReqwestTransport::new()?);
//! let options = RequestOptions::from_url("https://api.github.com/repos/o/r/releases/latest")?;
//!
//! let _release: Option<serde_json::Value> =
//!     executor.request_json(options, &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
mod data;
mod effects;
mod error;

pub use crate::core::{
    configure_request_options, configure_request_url, parse_json, prepare_redirect_options,
    safe_stringify_json,
};
pub use data::{
    DownloadOptions, ExecutorConfig, Headers, INACTIVITY_TIMEOUT, MAX_BUFFER_SIZE, MAX_REDIRECTS,
    Progress, RequestOptions,
};
pub use effects::{
    Body, BoxStream, BufferSink, FileSink, HttpExecutor, Pipeline, ProgressStage, RedirectStrategy,
    Response, ResponseHandler, Stage, Transport,
};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestTransport;
pub use error::{Error, HttpError, Result, TransportError};
pub use tokio_util::sync::CancellationToken;
pub use updraft_verify;
