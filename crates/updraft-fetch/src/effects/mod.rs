//! I/O edge of the crate: the transport seam, the executor and the stages
//! and sinks a download streams through.

mod buffer;
mod executor;
mod file;
mod handler;
mod pipeline;
mod progress;
#[cfg(feature = "reqwest")]
mod reqwest_impl;
mod transport;

pub use buffer::BufferSink;
pub use executor::{HttpExecutor, RedirectStrategy};
pub use file::FileSink;
pub use handler::ResponseHandler;
pub use pipeline::{Pipeline, Stage};
pub use progress::ProgressStage;
#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
pub use transport::{Body, BoxStream, Response, Transport};
