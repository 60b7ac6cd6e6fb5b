//! Error types for the connection state machines.
//!
//! A [`ConnectionError`] is recorded when a peer moves to
//! [`State::Failed`](crate::State::Failed). It is a value the driver reads
//! back through `failure()`, never something a transition returns directly:
//! every transition still hands back an [`Outcome`](crate::Outcome).

use std::{io, time::Duration};

use ofp_proto::{MessageType, ProtocolError};
use thiserror::Error;

use crate::connection::State;

/// Why a connection failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A lifecycle call was made from a state that does not allow it
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// State the peer was in
        state: State,
        /// Call that was attempted
        operation: &'static str,
    },

    /// A message arrived that the current state does not accept
    #[error("unexpected {kind} while {state}")]
    UnexpectedMessage {
        /// State the peer was in
        state: State,
        /// Kind of the offending message
        kind: MessageType,
    },

    /// Feature negotiation did not finish in time
    #[error("features not exchanged within {waited:?}")]
    FeatureTimeout {
        /// Configured wait
        waited: Duration,
    },

    /// The peer did not answer a keepalive echo in time
    #[error("echo request {xid} unanswered")]
    KeepaliveTimeout {
        /// Transaction id of the unanswered echo
        xid: u32,
    },

    /// Received bytes did not decode or validate
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connection configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(&'static str),
}

impl ConnectionError {
    /// True if the connection failed because the peer went quiet.
    ///
    /// Timeouts say nothing about the peer's correctness, so a supervisor may
    /// reconnect. Everything else means the peer spoke the protocol wrong.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::FeatureTimeout { .. } | Self::KeepaliveTimeout { .. })
    }
}

impl From<ConnectionError> for io::Error {
    fn from(err: ConnectionError) -> Self {
        let kind = match &err {
            ConnectionError::FeatureTimeout { .. } | ConnectionError::KeepaliveTimeout { .. } => {
                io::ErrorKind::TimedOut
            },
            ConnectionError::InvalidState { .. }
            | ConnectionError::UnexpectedMessage { .. }
            | ConnectionError::Protocol(_) => io::ErrorKind::InvalidData,
            ConnectionError::Config(_) => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}
