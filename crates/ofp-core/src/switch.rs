//! Switch-side state machine.
//!
//! The switch waits for the controller's features request, answers it
//! through its [`Agent`], then forwards every command to the agent. It
//! answers echoes itself, refuses mutating commands while its controller
//! is a slave, and rejects role requests with a stale generation id.

use std::time::Instant;

use bytes::Bytes;
use ofp_proto::{
    Body, Message, MessageType,
    payloads::{ErrorMsg, FeaturesReply, Role, RoleMsg},
};
use tracing::{debug, trace};

use crate::{
    agent::Agent,
    config::ConnectionConfig,
    connection::{self, Lifecycle, Outcome, Peer, State},
    error::ConnectionError,
    timers::Timers,
};

/// Xid of the feature-wait timer. No request carries it.
pub const FEATURE_WAIT_XID: u32 = 0;

/// Switch end of one controller connection
#[derive(Debug)]
pub struct Switch<A> {
    life: Lifecycle,
    agent: A,
    role: Role,
    generation_id: Option<u64>,
    features: Option<FeaturesReply>,
}

impl<A: Agent> Switch<A> {
    /// Idle switch driving `agent`
    ///
    /// # Errors
    ///
    /// `Config` if `config` has a zero duration.
    pub fn new(agent: A, config: ConnectionConfig) -> Result<Self, ConnectionError> {
        config.validate()?;
        Ok(Self::build(agent, config))
    }

    fn build(agent: A, config: ConnectionConfig) -> Self {
        Self {
            life: Lifecycle::new(config, "switch"),
            agent,
            role: Role::Equal,
            generation_id: None,
            features: None,
        }
    }

    /// Borrow the agent
    pub const fn agent(&self) -> &A {
        &self.agent
    }

    /// Mutably borrow the agent, e.g. to queue an unsolicited message
    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    /// Give up the agent
    pub fn into_agent(self) -> A {
        self.agent
    }

    /// Role of the controller on this connection
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Last accepted master election generation
    pub const fn generation_id(&self) -> Option<u64> {
        self.generation_id
    }

    /// Features most recently sent to the controller
    pub const fn features(&self) -> Option<&FeaturesReply> {
        self.features.as_ref()
    }

    /// Pending timers
    pub const fn timers(&self) -> &Timers {
        self.life.timers()
    }

    /// Connection timing
    pub const fn config(&self) -> &ConnectionConfig {
        self.life.config()
    }

    fn drain(&mut self) -> Vec<Message> {
        let messages: Vec<Message> = self.agent.outbox().drain().collect();
        if let Some(features) = messages.iter().rev().find_map(|m| match m.body() {
            Body::FeaturesReply(features) => Some(features.clone()),
            _ => None,
        }) {
            self.features = Some(features);
        }
        messages
    }

    fn dispatch(&mut self, now: Instant, message: Message, raw: Option<&[u8]>) -> Outcome {
        match self.life.state() {
            State::Idle => self.life.unexpected(message.message_type()),
            State::FeatureWait => self.negotiate(now, &message),
            State::Established => self.established(now, &message, raw),
            State::Failed => Outcome::fail(),
        }
    }

    fn negotiate(&mut self, now: Instant, message: &Message) -> Outcome {
        if message.message_type() != MessageType::FeaturesRequest {
            return self.life.unexpected(message.message_type());
        }
        self.life.timers_mut().satisfy(FEATURE_WAIT_XID, MessageType::FeaturesRequest);
        self.life.establish(now);
        self.agent.features_request(now, message.xid());
        Outcome::ok(self.drain())
    }

    fn established(&mut self, now: Instant, message: &Message, raw: Option<&[u8]>) -> Outcome {
        let xid = message.xid();
        let kind = message.message_type();
        trace!(xid, %kind, "switch dispatch");

        if self.role == Role::Slave && kind.is_mutating() {
            debug!(xid, %kind, "refused from slave controller");
            let request = echoed(message, raw);
            return Outcome::ok(vec![message.reply(Body::Error(ErrorMsg::is_slave(&request)))]);
        }

        match message.body() {
            Body::EchoRequest(echo) => return Outcome::ok(vec![message.reply(Body::EchoReply(echo.clone()))]),
            Body::EchoReply(_) => {
                self.life.timers_mut().satisfy(xid, MessageType::EchoReply);
            },
            Body::FeaturesRequest => self.agent.features_request(now, xid),
            Body::GetConfigRequest => self.agent.get_config_request(now, xid),
            Body::SetConfig(config) => self.agent.set_config(now, xid, config),
            Body::PacketOut(packet) => self.agent.packet_out(now, xid, packet),
            Body::FlowMod(flow_mod) => self.agent.flow_mod(now, xid, flow_mod),
            Body::GroupMod(group_mod) => self.agent.group_mod(now, xid, group_mod),
            Body::PortMod(port_mod) => self.agent.port_mod(now, xid, port_mod),
            Body::TableMod(table_mod) => self.agent.table_mod(now, xid, table_mod),
            Body::StatsRequest(request) => self.agent.stats_request(now, xid, request),
            Body::BarrierRequest => self.agent.barrier_request(now, xid),
            Body::QueueGetConfigRequest(request) => self.agent.queue_get_config_request(now, xid, request),
            Body::RoleRequest(request) => return self.role_request(now, message, request, raw),
            _ => trace!(xid, %kind, "ignored"),
        }
        Outcome::ok(self.drain())
    }

    fn role_request(&mut self, now: Instant, message: &Message, request: &RoleMsg, raw: Option<&[u8]>) -> Outcome {
        if request.is_election() {
            if let Some(last) = self.generation_id {
                // generation ids wrap; compare by signed distance
                if (request.generation_id.wrapping_sub(last) as i64) < 0 {
                    debug!(xid = message.xid(), last, got = request.generation_id, "stale role request");
                    let echo = echoed(message, raw);
                    return Outcome::ok(vec![message.reply(Body::Error(ErrorMsg::stale_role(&echo)))]);
                }
            }
            self.generation_id = Some(request.generation_id);
        }
        if request.role != Role::NoChange && request.role != self.role {
            debug!(from = ?self.role, to = ?request.role, "controller role changed");
            self.role = request.role;
        }

        let current = RoleMsg { role: self.role, generation_id: self.generation_id.unwrap_or_default() };
        self.agent.role_request(now, message.xid(), &current);
        Outcome::ok(self.drain())
    }
}

/// Bytes of `message` to quote in an error reply
fn echoed(message: &Message, raw: Option<&[u8]>) -> Bytes {
    match raw {
        Some(raw) => Bytes::copy_from_slice(raw),
        None => message.to_bytes().unwrap_or_default(),
    }
}

impl<A: Agent + Default> Default for Switch<A> {
    fn default() -> Self {
        Self::build(A::default(), ConnectionConfig::default())
    }
}

impl<A: Agent> Peer for Switch<A> {
    fn init(&mut self, now: Instant) -> Outcome {
        if let Err(outcome) = self.life.start() {
            return outcome;
        }
        self.life.arm_feature_wait(now, FEATURE_WAIT_XID, MessageType::FeaturesRequest);
        self.agent.init(now);
        Outcome::idle()
    }

    fn recv(&mut self, now: Instant, message: Message) -> Outcome {
        self.dispatch(now, message, None)
    }

    fn recv_bytes(&mut self, now: Instant, bytes: &[u8]) -> Outcome {
        if self.life.state() == State::Failed {
            return Outcome::fail();
        }
        if self.life.skips_unknown(bytes) {
            return Outcome::idle();
        }
        match connection::decode(bytes) {
            Ok(message) => self.dispatch(now, message, Some(bytes)),
            Err(error) => self.life.fail(ConnectionError::Protocol(error)),
        }
    }

    fn time(&mut self, now: Instant) -> Outcome {
        self.life.tick(now)
    }

    fn poll(&mut self, _now: Instant) -> Outcome {
        match self.life.state() {
            State::Established => Outcome::ok(self.drain()),
            State::Failed => Outcome::fail(),
            State::Idle | State::FeatureWait => Outcome::idle(),
        }
    }

    fn fini(&mut self, now: Instant) -> Outcome {
        self.agent.fini(now);
        self.agent.outbox().drain().for_each(drop);
        self.life.reset();
        self.role = Role::Equal;
        self.generation_id = None;
        self.features = None;
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
