//! Controller-side state machine.
//!
//! The controller opens negotiation with a features request, establishes
//! when the matching reply arrives, then forwards every response and
//! notification to its [`Application`]. Requests the application sends are
//! tracked until their reply comes back or `request_timeout` passes.

use std::time::Instant;

use ofp_proto::{
    Body, Message, MessageType,
    payloads::{FeaturesReply, Role},
};
use tracing::{debug, trace};

use crate::{
    agent::Application,
    config::ConnectionConfig,
    connection::{self, Lifecycle, Outcome, Peer, State},
    error::ConnectionError,
    timers::Timers,
    xid,
};

/// Controller end of one switch connection
#[derive(Debug)]
pub struct Controller<P> {
    life: Lifecycle,
    app: P,
    features: Option<FeaturesReply>,
    role: Role,
}

impl<P: Application> Controller<P> {
    /// Idle controller driving `app`
    ///
    /// # Errors
    ///
    /// `Config` if `config` has a zero duration.
    pub fn new(app: P, config: ConnectionConfig) -> Result<Self, ConnectionError> {
        config.validate()?;
        Ok(Self::build(app, config))
    }

    fn build(app: P, config: ConnectionConfig) -> Self {
        Self { life: Lifecycle::new(config, "controller"), app, features: None, role: Role::Equal }
    }

    /// Borrow the application
    pub const fn application(&self) -> &P {
        &self.app
    }

    /// Mutably borrow the application, e.g. to queue a command
    pub fn application_mut(&mut self) -> &mut P {
        &mut self.app
    }

    /// Give up the application
    pub fn into_application(self) -> P {
        self.app
    }

    /// Switch features from the latest features reply
    pub const fn features(&self) -> Option<&FeaturesReply> {
        self.features.as_ref()
    }

    /// Role the switch last confirmed for this controller
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Pending timers
    pub const fn timers(&self) -> &Timers {
        self.life.timers()
    }

    /// Connection timing
    pub const fn config(&self) -> &ConnectionConfig {
        self.life.config()
    }

    /// Drain the application's outbox, tracking requests that expect a reply
    fn drain(&mut self, now: Instant) -> Vec<Message> {
        let messages: Vec<Message> = self.app.outbox().drain().collect();
        for message in &messages {
            if let Some(reply) = message.message_type().expected_reply() {
                trace!(xid = message.xid(), %reply, "awaiting reply");
                self.life.arm_request(now, message.xid(), reply);
            }
        }
        messages
    }

    fn dispatch(&mut self, now: Instant, message: Message) -> Outcome {
        match self.life.state() {
            State::Idle => self.life.unexpected(message.message_type()),
            State::FeatureWait => self.negotiate(now, &message),
            State::Established => self.established(now, &message),
            State::Failed => Outcome::fail(),
        }
    }

    fn negotiate(&mut self, now: Instant, message: &Message) -> Outcome {
        let Body::FeaturesReply(features) = message.body() else {
            return self.life.unexpected(message.message_type());
        };
        if !self.life.timers_mut().satisfy(message.xid(), MessageType::FeaturesReply) {
            debug!(xid = message.xid(), "features reply for an unknown request");
            return self.life.unexpected(MessageType::FeaturesReply);
        }

        debug!(datapath_id = features.datapath_id, n_tables = features.n_tables, "switch features");
        self.features = Some(features.clone());
        self.life.establish(now);
        self.app.features_reply(now, message.xid(), features);
        Outcome::ok(self.drain(now))
    }

    fn established(&mut self, now: Instant, message: &Message) -> Outcome {
        let xid = message.xid();
        let kind = message.message_type();
        trace!(xid, %kind, "controller dispatch");

        let timers = self.life.timers_mut();
        match message.body() {
            Body::EchoRequest(echo) => return Outcome::ok(vec![message.reply(Body::EchoReply(echo.clone()))]),
            Body::EchoReply(_) => {
                timers.satisfy(xid, MessageType::EchoReply);
            },
            Body::Error(error) => {
                timers.satisfy_xid(xid);
                debug!(xid, kind = ?error.kind, code = error.code, "switch reported error");
                self.app.error(now, xid, error);
            },
            Body::FeaturesReply(features) => {
                timers.satisfy(xid, MessageType::FeaturesReply);
                self.features = Some(features.clone());
                self.app.features_reply(now, xid, features);
            },
            Body::GetConfigReply(config) => {
                timers.satisfy(xid, MessageType::GetConfigReply);
                self.app.get_config_reply(now, xid, config);
            },
            Body::StatsReply(reply) => {
                if !reply.has_more() {
                    timers.satisfy(xid, MessageType::StatsReply);
                }
                self.app.stats_reply(now, xid, reply);
            },
            Body::BarrierReply => {
                timers.satisfy(xid, MessageType::BarrierReply);
                self.app.barrier_reply(now, xid);
            },
            Body::RoleReply(reply) => {
                timers.satisfy(xid, MessageType::RoleReply);
                if reply.role != Role::NoChange {
                    self.role = reply.role;
                }
                self.app.role_reply(now, xid, reply);
            },
            Body::QueueGetConfigReply(reply) => {
                timers.satisfy(xid, MessageType::QueueGetConfigReply);
                self.app.queue_get_config_reply(now, xid, reply);
            },
            Body::PacketIn(packet) => self.app.packet_in(now, xid, packet),
            Body::FlowRemoved(removed) => self.app.flow_removed(now, xid, removed),
            Body::PortStatus(status) => self.app.port_status(now, xid, status),
            _ => trace!(xid, %kind, "ignored"),
        }
        Outcome::ok(self.drain(now))
    }
}

impl<P: Application + Default> Default for Controller<P> {
    fn default() -> Self {
        Self::build(P::default(), ConnectionConfig::default())
    }
}

impl<P: Application> Peer for Controller<P> {
    fn init(&mut self, now: Instant) -> Outcome {
        if let Err(outcome) = self.life.start() {
            return outcome;
        }
        let xid = xid::next();
        self.life.arm_feature_wait(now, xid, MessageType::FeaturesReply);
        self.app.init(now);
        Outcome::ok(vec![Message::with_xid(xid, Body::FeaturesRequest)])
    }

    fn recv(&mut self, now: Instant, message: Message) -> Outcome {
        self.dispatch(now, message)
    }

    fn recv_bytes(&mut self, now: Instant, bytes: &[u8]) -> Outcome {
        if self.life.state() == State::Failed {
            return Outcome::fail();
        }
        if self.life.skips_unknown(bytes) {
            return Outcome::idle();
        }
        match connection::decode(bytes) {
            Ok(message) => self.dispatch(now, message),
            Err(error) => self.life.fail(ConnectionError::Protocol(error)),
        }
    }

    fn time(&mut self, now: Instant) -> Outcome {
        self.life.tick(now)
    }

    fn poll(&mut self, now: Instant) -> Outcome {
        match self.life.state() {
            State::Established => Outcome::ok(self.drain(now)),
            State::Failed => Outcome::fail(),
            State::Idle | State::FeatureWait => Outcome::idle(),
        }
    }

    fn fini(&mut self, now: Instant) -> Outcome {
        self.app.fini(now);
        self.app.outbox().drain().for_each(drop);
        self.life.reset();
        self.features = None;
        self.role = Role::Equal;
        Outcome::idle()
    }

    fn state(&self) -> State {
        self.life.state()
    }

    fn failure(&self) -> Option<&ConnectionError> {
        self.life.failure()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.life.next_deadline()
    }
}
