//! Immutable data types shared by the executor layers.
//!
//! Request parameters, caller options, limits and progress reports. Nothing
//! here performs I/O.

pub mod config;
pub mod headers;
pub mod options;
pub mod progress;

pub use config::{ExecutorConfig, INACTIVITY_TIMEOUT, MAX_BUFFER_SIZE, MAX_REDIRECTS};
pub use headers::Headers;
pub use options::{DownloadOptions, RequestOptions};
pub use progress::Progress;
