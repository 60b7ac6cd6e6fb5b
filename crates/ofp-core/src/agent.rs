//! Business logic collaborators.
//!
//! The state machines own the protocol; an [`Agent`] (switch side) or an
//! [`Application`] (controller side) owns everything else. The FSM calls
//! exactly one method per accepted message, then drains the collaborator's
//! [`Outbox`] and returns whatever was queued.
//!
//! Every method is required. A collaborator that ignores a message kind
//! says so with an empty body in its own impl.

use std::{collections::VecDeque, time::Instant};

use ofp_proto::{
    Body, Message,
    payloads::{
        ErrorMsg, FeaturesReply, FlowMod, FlowRemoved, GroupMod, PacketIn, PacketOut, PortMod, PortStatus,
        QueueGetConfigReply, QueueGetConfigRequest, RoleMsg, StatsReply, StatsRequest, SwitchConfig, TableMod,
    },
};

use crate::xid;

/// Messages a collaborator wants sent, in order.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Message>,
}

impl Outbox {
    /// Empty outbox
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a complete message
    pub fn push(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    /// Queue an answer to the request carrying `xid`
    pub fn reply(&mut self, xid: u32, body: Body) {
        self.push(Message::with_xid(xid, body));
    }

    /// Queue a new request or notification under a fresh xid.
    ///
    /// Returns the xid.
    pub fn send(&mut self, body: Body) -> u32 {
        let xid = xid::next();
        self.push(Message::with_xid(xid, body));
        xid
    }

    /// Take everything queued
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.queue.drain(..)
    }

    /// Number of queued messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Switch-side collaborator: the datapath.
///
/// Each request callback gets the request's xid so replies can reuse it.
pub trait Agent {
    /// Queue the FSM drains after every callback
    fn outbox(&mut self) -> &mut Outbox;

    /// Connection started
    fn init(&mut self, now: Instant);

    /// Connection torn down
    fn fini(&mut self, now: Instant);

    /// Controller asked for features. Expected to queue a features reply.
    fn features_request(&mut self, now: Instant, xid: u32);

    /// Controller asked for the switch config
    fn get_config_request(&mut self, now: Instant, xid: u32);

    /// Controller set the switch config
    fn set_config(&mut self, now: Instant, xid: u32, config: &SwitchConfig);

    /// Controller injected a packet
    fn packet_out(&mut self, now: Instant, xid: u32, packet: &PacketOut);

    /// Flow table modification
    fn flow_mod(&mut self, now: Instant, xid: u32, flow_mod: &FlowMod);

    /// Group table modification
    fn group_mod(&mut self, now: Instant, xid: u32, group_mod: &GroupMod);

    /// Port modification
    fn port_mod(&mut self, now: Instant, xid: u32, port_mod: &PortMod);

    /// Table configuration
    fn table_mod(&mut self, now: Instant, xid: u32, table_mod: &TableMod);

    /// Statistics request
    fn stats_request(&mut self, now: Instant, xid: u32, request: &StatsRequest);

    /// Barrier. Everything before it has been handed over already.
    fn barrier_request(&mut self, now: Instant, xid: u32);

    /// Queue configuration request
    fn queue_get_config_request(&mut self, now: Instant, xid: u32, request: &QueueGetConfigRequest);

    /// Role request that passed the generation check. `current` holds the
    /// role and generation id in force after applying it, which is what
    /// the role reply should report.
    fn role_request(&mut self, now: Instant, xid: u32, current: &RoleMsg);
}

/// Controller-side collaborator.
pub trait Application {
    /// Queue the FSM drains after every callback
    fn outbox(&mut self) -> &mut Outbox;

    /// Connection started
    fn init(&mut self, now: Instant);

    /// Connection torn down
    fn fini(&mut self, now: Instant);

    /// Switch reported an error
    fn error(&mut self, now: Instant, xid: u32, error: &ErrorMsg);

    /// Switch features, once during the handshake and again on request
    fn features_reply(&mut self, now: Instant, xid: u32, features: &FeaturesReply);

    /// Current switch config
    fn get_config_reply(&mut self, now: Instant, xid: u32, config: &SwitchConfig);

    /// Packet sent up by the switch
    fn packet_in(&mut self, now: Instant, xid: u32, packet: &PacketIn);

    /// Flow entry removed
    fn flow_removed(&mut self, now: Instant, xid: u32, removed: &FlowRemoved);

    /// Port changed
    fn port_status(&mut self, now: Instant, xid: u32, status: &PortStatus);

    /// One part of a statistics reply
    fn stats_reply(&mut self, now: Instant, xid: u32, reply: &StatsReply);

    /// Barrier completed
    fn barrier_reply(&mut self, now: Instant, xid: u32);

    /// Role acknowledged
    fn role_reply(&mut self, now: Instant, xid: u32, reply: &RoleMsg);

    /// Queue configuration
    fn queue_get_config_reply(&mut self, now: Instant, xid: u32, reply: &QueueGetConfigReply);
}
