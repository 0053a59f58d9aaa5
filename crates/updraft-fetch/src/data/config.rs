use std::time::Duration;

/// Redirects followed per logical call before giving up.
pub const MAX_REDIRECTS: u32 = 10;

/// Upper bound for in-memory downloads (50 MB).
pub const MAX_BUFFER_SIZE: u64 = 50 * 1024 * 1024;

/// How long a connection may stay silent before the call fails.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Executor-wide limits.
///
/// Shared read-only by every call made through one executor.
///
/// # Examples
///
/// ```
/// use updraft_fetch::ExecutorConfig;
/// use std::time::Duration;
///
/// let config = ExecutorConfig::default()
///     .max_redirects(5)
///     .inactivity_timeout(Duration::from_secs(15));
/// assert_eq!(config.max_buffer_size, 52_428_800);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Default: 10
    pub max_redirects: u32,

    /// Default: 52,428,800 bytes
    pub max_buffer_size: u64,

    /// Applied to the response head and to every body chunk.
    ///
    /// Default: 60s
    pub inactivity_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_redirects: MAX_REDIRECTS,
            max_buffer_size: MAX_BUFFER_SIZE,
            inactivity_timeout: INACTIVITY_TIMEOUT,
        }
    }
}

impl ExecutorConfig {
    #[must_use]
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    #[must_use]
    pub fn max_buffer_size(mut self, max_buffer_size: u64) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    #[must_use]
    pub fn inactivity_timeout(mut self, inactivity_timeout: Duration) -> Self {
        self.inactivity_timeout = inactivity_timeout;
        self
    }
}
