// Connection and timeout configuration arguments
// Licensed under GPL-3.0

use crate::transport::ConnectionPolicy;
use crate::utils::retry::RetryConfig;
use clap::Args;
use std::time::Duration;

/// Connection and timeout configuration options
///
/// One policy is built from these and used for every connection the scan
/// opens, baseline handshakes and probes alike.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Socket (read/write) timeout in seconds
    #[arg(long = "socket-timeout", value_name = "SECONDS", default_value = "5")]
    pub socket_timeout: u64,

    /// Connection timeout in seconds (separate from socket timeout)
    #[arg(long = "connect-timeout", value_name = "SECONDS", default_value = "10")]
    pub connect_timeout: u64,

    /// Maximum number of retries for transient network failures (0 = no retries)
    /// Timeouts and DNS failures are never retried
    #[arg(long = "max-retries", value_name = "COUNT", default_value = "5")]
    pub max_retries: usize,

    /// Delay before the first retry in milliseconds
    #[arg(long = "retry-backoff", value_name = "MSEC", default_value = "1000")]
    pub retry_backoff_ms: u64,

    /// Added to the delay after every retry, in milliseconds (at least 1)
    #[arg(
        long = "retry-step",
        value_name = "MSEC",
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub retry_step_ms: u64,

    /// Upper bound on the total time spent waiting between retries, in milliseconds
    #[arg(long = "max-total-backoff", value_name = "MSEC", default_value = "15000")]
    pub max_total_backoff_ms: u64,

    /// Disable retry logic (fail immediately on first error)
    /// Equivalent to --max-retries 0
    #[arg(long = "no-retry")]
    pub no_retry: bool,
}

impl Default for ConnectionArgs {
    fn default() -> Self {
        Self {
            socket_timeout: 5,
            connect_timeout: 10,
            max_retries: 5,
            retry_backoff_ms: 1000,
            retry_step_ms: 1000,
            max_total_backoff_ms: 15000,
            no_retry: false,
        }
    }
}

impl ConnectionArgs {
    pub fn retry_config(&self) -> RetryConfig {
        if self.no_retry || self.max_retries == 0 {
            return RetryConfig::no_retry();
        }
        RetryConfig::new(
            self.max_retries,
            Duration::from_millis(self.retry_backoff_ms),
            Duration::from_millis(self.retry_step_ms),
            Duration::from_millis(self.max_total_backoff_ms),
        )
    }

    pub fn connection_policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            socket_timeout: Duration::from_secs(self.socket_timeout),
            retry: self.retry_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_defaults_match_policy_defaults() {
        assert_eq!(
            ConnectionArgs::default().connection_policy(),
            ConnectionPolicy::default()
        );
    }

    #[test]
    fn test_no_retry_wins() {
        let args = ConnectionArgs {
            no_retry: true,
            ..Default::default()
        };
        assert_eq!(args.retry_config(), RetryConfig::no_retry());

        let zero = ConnectionArgs {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(zero.retry_config().max_retries, 0);
    }

    #[test]
    fn test_zero_retry_step_rejected() {
        let err = Args::try_parse_from(["tlsprobe", "example.com", "--retry-step", "0"]);
        assert!(err.is_err());

        let args =
            Args::try_parse_from(["tlsprobe", "example.com", "--retry-step", "250"]).unwrap();
        assert_eq!(
            args.connection.retry_config().backoff_step,
            Duration::from_millis(250)
        );
    }
}
