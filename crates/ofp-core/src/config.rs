//! Connection timing configuration.

use std::time::Duration;

use crate::error::ConnectionError;

/// Timeouts shared by both peer roles.
///
/// Built with a struct literal, usually over `..Default::default()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// How long feature negotiation may take after `init`
    pub feature_wait: Duration,
    /// Time between keepalive echoes
    pub keepalive_interval: Duration,
    /// How long an echo may go unanswered before the connection fails
    pub keepalive_timeout: Duration,
    /// How long a request may wait for its reply. Expiry is only logged.
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            feature_wait: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(15),
            keepalive_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectionConfig {
    /// Reject configurations that would fire timers immediately.
    ///
    /// # Errors
    ///
    /// `Config` naming the first zero duration.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.feature_wait.is_zero() {
            return Err(ConnectionError::Config("feature_wait must be non-zero"));
        }
        if self.keepalive_interval.is_zero() {
            return Err(ConnectionError::Config("keepalive_interval must be non-zero"));
        }
        if self.keepalive_timeout.is_zero() {
            return Err(ConnectionError::Config("keepalive_timeout must be non-zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConnectionError::Config("request_timeout must be non-zero"));
        }
        Ok(())
    }
}
