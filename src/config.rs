//! # Client Configuration
//!
//! Connection settings for one softener. Everything except the host has a
//! default matching the device family's behaviour:
//!
//! - **Attempt timeout**: 5 s per HTTP POST
//! - **Attempts**: 5 per query (1 initial + 4 retries)
//! - **Retry delay**: 1 ms, only to yield the scheduler
//! - **Poll interval**: 5 s between polls of the consuming layer

use std::time::Duration;

use crate::constants::{ATTEMPT_TIMEOUT, MAX_ATTEMPTS, MUX_PATH, POLL_INTERVAL, RETRY_DELAY};
use crate::error::{MuxError, MuxResult};

/// Settings of a [`MuxClient`](crate::client::MuxClient).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use softliq_mux::MuxConfig;
///
/// let config = MuxConfig::new("192.168.1.20")
///     .with_max_attempts(3)
///     .with_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.endpoint(), "http://192.168.1.20/mux_http");
/// assert_eq!(config.max_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxConfig {
    /// Device host name or IP address, optionally with `:port`
    pub host: String,
    /// Timeout of a single HTTP attempt
    pub timeout: Duration,
    /// Total attempts per query
    pub max_attempts: u32,
    /// Pause between two attempts
    pub retry_delay: Duration,
    /// Interval between two polls
    pub poll_interval: Duration,
}

impl MuxConfig {
    /// Create a configuration with defaults for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: ATTEMPT_TIMEOUT,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total number of attempts per query.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// URL of the MUX endpoint
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.host, MUX_PATH)
    }

    /// Check that the configuration can drive a client
    pub fn validate(&self) -> MuxResult<()> {
        if self.host.trim().is_empty() {
            return Err(MuxError::configuration("host must not be empty"));
        }
        if self.host.contains('/') {
            return Err(MuxError::configuration(format!(
                "host must not contain a path or scheme: {}",
                self.host
            )));
        }
        if self.max_attempts == 0 {
            return Err(MuxError::configuration("max_attempts must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(MuxError::configuration("poll_interval must not be zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
