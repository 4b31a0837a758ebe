//! Materialization configuration.
//!
//! The original system kept its lock-retry policy as process-wide
//! constants; here it is an explicit value passed at call time, so embedders
//! choose the policy once at startup and nothing is ambient.

use std::time::Duration;

/// Lock-retry policy for a materialization call.
///
/// When the engine reports transient contention (`Busy`/`Locked`), the
/// materializer sleeps `retry_sleep` and re-attempts the same step, giving
/// the writer holding the lock a chance to finish. After `retry_limit`
/// consecutive contention outcomes the call fails with a lock timeout.
#[derive(Debug, Clone)]
pub struct MaterializeConfig {
    /// Consecutive `Busy`/`Locked` outcomes tolerated before failing.
    pub retry_limit: u32,
    /// Sleep between retries.
    pub retry_sleep: Duration,
}

impl MaterializeConfig {
    /// Default retry ceiling.
    pub const DEFAULT_RETRY_LIMIT: u32 = 50;

    /// Default sleep between retries.
    pub const DEFAULT_RETRY_SLEEP: Duration = Duration::from_millis(1);

    /// The default policy: up to 50 retries, 1 ms apart.
    #[must_use]
    pub fn new() -> Self {
        Self {
            retry_limit: Self::DEFAULT_RETRY_LIMIT,
            retry_sleep: Self::DEFAULT_RETRY_SLEEP,
        }
    }

    /// Override the retry ceiling.
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Override the sleep between retries. `Duration::ZERO` disables the
    /// backoff sleep while keeping the bounded retry count.
    #[must_use]
    pub fn with_retry_sleep(mut self, retry_sleep: Duration) -> Self {
        self.retry_sleep = retry_sleep;
        self
    }
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self::new()
    }
}
