use std::future::Future;

use super::transport::Response;
use crate::data::DownloadOptions;
use crate::error::Result;

/// Consumes a successful download response.
///
/// The executor hands over the response once status and redirects are
/// settled; the handler owns the body from then on.
///
/// # Implementations
///
/// - [`FileSink`](crate::FileSink): verified, staged write to a file
/// - [`BufferSink`](crate::BufferSink): size-capped in-memory collection
pub trait ResponseHandler: Send {
    type Output: Send;

    fn handle(
        self,
        response: Response,
        options: &DownloadOptions,
    ) -> impl Future<Output = Result<Self::Output>> + Send;
}
