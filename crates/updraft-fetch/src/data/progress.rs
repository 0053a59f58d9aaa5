/// Progress of a streamed download.
///
/// Passed by reference to the progress callback configured on
/// [`DownloadOptions`](crate::DownloadOptions).
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Total expected bytes, from the Content-Length header.
    pub total: u64,

    /// Bytes received since the previous report.
    pub delta: u64,

    /// Bytes received so far.
    pub transferred: u64,

    /// Completion in the range `0.0..=100.0`.
    pub percent: f64,

    /// Average rate since the transfer started.
    pub bytes_per_second: f64,
}

impl Progress {
    /// Returns `true` for the final report of a transfer.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.transferred >= self.total }
}
