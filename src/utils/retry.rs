// Retry utilities - Linear backoff for blocking connection attempts
//
// Transient connection errors (refused, reset, aborted, interrupted, broken
// pipe, unreachable network) are retried with a growing delay. Timeouts and
// DNS failures are never retried: a server that did not answer in time is
// reported as unreachable straight away.

use std::io;
use std::time::Duration;

/// Configuration for retry behavior with linear backoff.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tlsprobe::utils::retry::RetryConfig;
///
/// let config = RetryConfig::default();
/// assert_eq!(config.schedule().iter().sum::<Duration>(), Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts before giving up.
    /// Default: 5
    pub max_retries: usize,

    /// Delay before the first retry.
    /// Default: 1 second
    pub initial_backoff: Duration,

    /// Added to the delay after every retry.
    /// Default: 1 second
    pub backoff_step: Duration,

    /// Upper bound on the sum of all delays.
    /// Default: 15 seconds
    pub max_total_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            backoff_step: Duration::from_secs(1),
            max_total_backoff: Duration::from_secs(15),
        }
    }
}

/// Smallest step `RetryConfig::new` accepts; delays must strictly grow
pub const MIN_BACKOFF_STEP: Duration = Duration::from_millis(1);

impl RetryConfig {
    /// A `backoff_step` below `MIN_BACKOFF_STEP` is raised to it.
    pub fn new(
        max_retries: usize,
        initial_backoff: Duration,
        backoff_step: Duration,
        max_total_backoff: Duration,
    ) -> Self {
        if backoff_step < MIN_BACKOFF_STEP {
            tracing::debug!(
                "Retry step {:?} raised to {:?}",
                backoff_step,
                MIN_BACKOFF_STEP
            );
        }
        Self {
            max_retries,
            initial_backoff,
            backoff_step: backoff_step.max(MIN_BACKOFF_STEP),
            max_total_backoff,
        }
    }

    /// Create a configuration with no retries (fail immediately on error).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            backoff_step: Duration::ZERO,
            max_total_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        let steps = retry.saturating_sub(1) as u32;
        self.initial_backoff + self.backoff_step.saturating_mul(steps)
    }

    /// Every delay that may be slept, in order
    pub fn schedule(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut total = Duration::ZERO;

        for retry in 1..=self.max_retries {
            let delay = self.delay_for(retry);
            if total + delay > self.max_total_backoff {
                break;
            }
            total += delay;
            delays.push(delay);
        }

        delays
    }
}

/// Something that can wait between attempts
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Last error seen once retrying stopped
#[derive(Debug)]
pub struct RetryFailure {
    pub error: io::Error,
    pub attempts: usize,
}

/// Retry a blocking operation with linear backoff.
pub fn retry_with_backoff<T, F>(config: &RetryConfig, operation: F) -> Result<T, RetryFailure>
where
    F: FnMut() -> io::Result<T>,
{
    retry_with_sleeper(config, &ThreadSleeper, operation)
}

/// Retry with an explicit sleeper.
pub fn retry_with_sleeper<T, F, S>(
    config: &RetryConfig,
    sleeper: &S,
    mut operation: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> io::Result<T>,
    S: Sleeper + ?Sized,
{
    let schedule = config.schedule();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match operation() {
            Ok(result) => {
                if attempts > 1 {
                    tracing::debug!("Operation succeeded after {} retry(ies)", attempts - 1);
                }
                return Ok(result);
            }
            Err(e) => {
                if !is_io_error_retriable(&e) {
                    tracing::debug!("Non-retriable error encountered: {}", e);
                    return Err(RetryFailure { error: e, attempts });
                }

                let Some(delay) = schedule.get(attempts - 1).copied() else {
                    tracing::debug!(
                        "Retry budget ({} retries, {:?}) exhausted, giving up: {}",
                        schedule.len(),
                        config.max_total_backoff,
                        e
                    );
                    return Err(RetryFailure { error: e, attempts });
                };

                tracing::warn!(
                    "Attempt {}/{} failed: {}, retrying in {:?}",
                    attempts,
                    schedule.len() + 1,
                    e,
                    delay
                );
                sleeper.sleep(delay);
            }
        }
    }
}

/// Analyze IO error to determine if it's retriable.
pub fn is_io_error_retriable(error: &io::Error) -> bool {
    use io::ErrorKind;

    match error.kind() {
        ErrorKind::ConnectionRefused => true,
        ErrorKind::ConnectionReset => true,
        ErrorKind::ConnectionAborted => true,
        ErrorKind::BrokenPipe => true,
        ErrorKind::Interrupted => true,
        ErrorKind::WouldBlock => true,

        // A silent server stays silent
        ErrorKind::TimedOut => false,
        ErrorKind::NotFound => false,
        ErrorKind::PermissionDenied => false,
        ErrorKind::AddrNotAvailable => false,
        ErrorKind::AddrInUse => false,
        ErrorKind::InvalidInput => false,
        ErrorKind::InvalidData => false,

        _ => {
            let msg = error.to_string().to_lowercase();
            msg.contains("network unreachable")
                || msg.contains("network is unreachable")
                || msg.contains("host unreachable")
                || msg.contains("no route to host")
        }
    }
}
