//! Connection lifecycle shared by both peer roles.
//!
//! # Architecture: Outcome-Based State Machine
//!
//! Each transition takes the current time as a parameter and returns an
//! [`Outcome`]: whether the connection should continue, and the messages to
//! send in order. The FSM never reads the clock, never sleeps and never
//! touches a socket. A driver feeds it bytes and clock ticks and carries out
//! what it returns.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  init   ┌─────────────┐  features   ┌─────────────┐
//! │ Idle │────────>│ FeatureWait │────────────>│ Established │
//! └──────┘         └─────────────┘             └─────────────┘
//!    ↑                    │ timeout/violation         │ keepalive timeout/
//!    │ fini               ↓                           ↓ malformed input
//!    └────────────── ┌────────┐<──────────────────────┘
//!                    │ Failed │
//!                    └────────┘
//! ```
//!
//! `fini` returns any state to `Idle`.
//!
//! # Timers
//!
//! - **Feature wait**: negotiation must finish within `feature_wait`.
//! - **Keepalive**: every `keepalive_interval` an echo request goes out and
//!   must be answered within `keepalive_timeout`.
//! - **Requests**: controller requests wait `request_timeout` for their
//!   reply. Expiry is logged, not fatal.

use std::{
    fmt,
    time::{Duration, Instant},
};

use bytes::Bytes;
use ofp_proto::{Body, Message, MessageHeader, MessageType, ProtocolError, Wire, payloads::Echo};
use tracing::{debug, trace, warn};

use crate::{config::ConnectionConfig, error::ConnectionError, timers::Timers, xid};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// Not started, or torn down
    #[default]
    Idle,
    /// Started, waiting for feature negotiation
    FeatureWait,
    /// Features exchanged, messages flow
    Established,
    /// Terminal until `fini`; the transport must be closed
    Failed,
}

impl State {
    /// Lower-case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FeatureWait => "feature-wait",
            Self::Established => "established",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of every transition
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Outcome {
    /// False means the peer is `Failed` and the transport must be closed
    pub proceed: bool,
    /// Messages to send, in order
    pub messages: Vec<Message>,
}

impl Outcome {
    /// Continue, sending `messages`
    pub fn ok(messages: Vec<Message>) -> Self {
        Self { proceed: true, messages }
    }

    /// Continue, sending nothing
    pub fn idle() -> Self {
        Self::ok(Vec::new())
    }

    /// Stop
    pub fn fail() -> Self {
        Self { proceed: false, messages: Vec::new() }
    }

    /// Encode every message for the transport
    ///
    /// # Errors
    ///
    /// The first encode failure.
    pub fn encode(&self) -> Result<Vec<Bytes>, ProtocolError> {
        self.messages.iter().map(Message::to_bytes).collect()
    }

    /// Kinds of the outbound messages, in order
    #[must_use]
    pub fn kinds(&self) -> Vec<MessageType> {
        self.messages.iter().map(Message::message_type).collect()
    }
}

/// A connection endpoint either role can implement.
///
/// Drivers run a `Switch` or a `Controller` through this trait without
/// knowing which one they hold.
pub trait Peer {
    /// Start the connection. Only valid from `Idle`.
    fn init(&mut self, now: Instant) -> Outcome;

    /// Handle one decoded message
    fn recv(&mut self, now: Instant, message: Message) -> Outcome;

    /// Decode, validate and handle one complete message block.
    ///
    /// Any decode or validation failure fails the connection.
    fn recv_bytes(&mut self, now: Instant, bytes: &[u8]) -> Outcome;

    /// Advance timers to `now`
    fn time(&mut self, now: Instant) -> Outcome;

    /// Send whatever the collaborator queued outside a callback
    fn poll(&mut self, now: Instant) -> Outcome;

    /// Tear down and return to `Idle`
    fn fini(&mut self, now: Instant) -> Outcome;

    /// Current state
    fn state(&self) -> State;

    /// Why the connection failed, while `Failed`
    fn failure(&self) -> Option<&ConnectionError>;

    /// When `time` next has work to do
    fn next_deadline(&self) -> Option<Instant>;
}

/// Decode and validate one message block
pub(crate) fn decode(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let message = Message::from_bytes(bytes)?;
    message.validate()?;
    Ok(message)
}

/// State, timers and failure bookkeeping common to both roles.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: State,
    config: ConnectionConfig,
    timers: Timers,
    keepalive_at: Option<Instant>,
    keepalives: Vec<u32>,
    failure: Option<ConnectionError>,
    role: &'static str,
}

impl Lifecycle {
    pub(crate) fn new(config: ConnectionConfig, role: &'static str) -> Self {
        Self {
            state: State::Idle,
            config,
            timers: Timers::new(),
            keepalive_at: None,
            keepalives: Vec::new(),
            failure: None,
            role,
        }
    }

    pub(crate) const fn state(&self) -> State {
        self.state
    }

    pub(crate) const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub(crate) const fn timers(&self) -> &Timers {
        &self.timers
    }

    pub(crate) fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    pub(crate) const fn failure(&self) -> Option<&ConnectionError> {
        self.failure.as_ref()
    }

    fn transition(&mut self, next: State) {
        if self.state != next {
            debug!(role = self.role, from = %self.state, to = %next, "state change");
            self.state = next;
        }
    }

    /// Leave `Idle` for `FeatureWait`, or fail if not idle
    pub(crate) fn start(&mut self) -> Result<(), Outcome> {
        if self.state != State::Idle {
            let error = ConnectionError::InvalidState { state: self.state, operation: "init" };
            return Err(self.fail(error));
        }
        self.transition(State::FeatureWait);
        Ok(())
    }

    /// Arm `(xid, kind)` to expire `after` from `now`. A deadline past the
    /// end of the clock is never armed.
    fn arm(&mut self, now: Instant, after: Duration, xid: u32, kind: MessageType) {
        match now.checked_add(after) {
            Some(deadline) => self.timers.arm(xid, kind, deadline),
            None => warn!(role = self.role, xid, %kind, ?after, "deadline out of range, not armed"),
        }
    }

    /// Arm the negotiation deadline for `(xid, kind)`
    pub(crate) fn arm_feature_wait(&mut self, now: Instant, xid: u32, kind: MessageType) {
        debug!(role = self.role, xid, %kind, "feature wait armed");
        self.arm(now, self.config.feature_wait, xid, kind);
    }

    /// Wait `request_timeout` for the `reply` to request `xid`
    pub(crate) fn arm_request(&mut self, now: Instant, xid: u32, reply: MessageType) {
        self.arm(now, self.config.request_timeout, xid, reply);
    }

    /// Enter `Established` and schedule the first keepalive
    pub(crate) fn establish(&mut self, now: Instant) {
        self.transition(State::Established);
        self.keepalive_at = now.checked_add(self.config.keepalive_interval);
    }

    /// Record `error`, drop all timers and stop
    pub(crate) fn fail(&mut self, error: ConnectionError) -> Outcome {
        warn!(role = self.role, state = %self.state, %error, "connection failed");
        self.transition(State::Failed);
        self.timers.clear();
        self.keepalive_at = None;
        self.keepalives.clear();
        self.failure = Some(error);
        Outcome::fail()
    }

    /// True if `bytes` is a well-formed message of a kind this crate does
    /// not know, received while `Established`. Such messages are skipped.
    pub(crate) fn skips_unknown(&self, bytes: &[u8]) -> bool {
        if self.state != State::Established {
            return false;
        }
        let Ok(header) = MessageHeader::parse(bytes) else {
            return false;
        };
        let unknown = header.version() == MessageHeader::VERSION
            && usize::from(header.length()) == bytes.len()
            && header.message_type().is_none();
        if unknown {
            trace!(role = self.role, raw_type = header.raw_type(), xid = header.xid(), "unknown message ignored");
        }
        unknown
    }

    /// Message arrived in a state that does not accept it
    pub(crate) fn unexpected(&mut self, kind: MessageType) -> Outcome {
        let state = self.state;
        self.fail(ConnectionError::UnexpectedMessage { state, kind })
    }

    /// Back to `Idle` with nothing pending
    pub(crate) fn reset(&mut self) {
        self.transition(State::Idle);
        self.timers.clear();
        self.keepalive_at = None;
        self.keepalives.clear();
        self.failure = None;
    }

    /// Earliest instant at which [`tick`](Self::tick) has work
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        match (self.keepalive_at, self.timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Shared `time` transition.
    ///
    /// In `FeatureWait` any expiry is fatal. In `Established` a due
    /// keepalive goes out first, then expired timers are popped: an
    /// unanswered keepalive is fatal, anything else only logged.
    pub(crate) fn tick(&mut self, now: Instant) -> Outcome {
        match self.state {
            State::Idle => Outcome::idle(),
            State::Failed => Outcome::fail(),
            State::FeatureWait => {
                if self.timers.expire(now).is_empty() {
                    Outcome::idle()
                } else {
                    let waited = self.config.feature_wait;
                    self.fail(ConnectionError::FeatureTimeout { waited })
                }
            },
            State::Established => {
                let mut messages = Vec::new();
                if self.keepalive_at.is_some_and(|at| at <= now) {
                    let xid = xid::next();
                    self.arm(now, self.config.keepalive_timeout, xid, MessageType::EchoReply);
                    self.keepalives.push(xid);
                    self.keepalive_at = now.checked_add(self.config.keepalive_interval);
                    debug!(role = self.role, xid, "keepalive sent");
                    messages.push(Message::with_xid(xid, Body::EchoRequest(Echo::default())));
                }

                for timer in self.timers.expire(now) {
                    if timer.kind == MessageType::EchoReply && self.keepalives.contains(&timer.xid) {
                        return self.fail(ConnectionError::KeepaliveTimeout { xid: timer.xid });
                    }
                    warn!(role = self.role, xid = timer.xid, kind = %timer.kind, "request timed out");
                }
                let timers = &self.timers;
                self.keepalives.retain(|&xid| timers.deadline_of(xid, MessageType::EchoReply).is_some());
                Outcome::ok(messages)
            },
        }
    }
}
