//! Harness errors

use std::io;

use ofp_core::ConnectionError;
use ofp_proto::ProtocolError;
use thiserror::Error;

/// Why a driven connection stopped
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Reading from or writing to the stream failed
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The byte stream could not be framed or an outbound message could not
    /// be encoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The state machine failed
    #[error("connection failed: {0}")]
    Connection(#[from] ConnectionError),

    /// The state machine stopped without recording a failure
    #[error("connection closed")]
    Closed,
}

impl HarnessError {
    /// True if the connection failed on a timer
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Connection(err) => err.is_timeout(),
            Self::Io(err) => err.kind() == io::ErrorKind::TimedOut,
            Self::Protocol(_) | Self::Closed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeouts_are_recognised() {
        let err = HarnessError::from(ConnectionError::FeatureTimeout { waited: Duration::from_secs(1) });
        assert!(err.is_timeout());
        assert!(HarnessError::from(io::Error::from(io::ErrorKind::TimedOut)).is_timeout());
        assert!(!HarnessError::Closed.is_timeout());
    }

    #[test]
    fn display_wraps_source() {
        let err = HarnessError::from(ConnectionError::KeepaliveTimeout { xid: 9 });
        assert!(err.to_string().starts_with("connection failed: "));
    }
}
