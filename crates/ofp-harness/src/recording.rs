//! Recording collaborators for scenario tests.
//!
//! [`RecordingAgent`] behaves like a small switch: it answers the requests a
//! real datapath must answer, applies configuration, and remembers every
//! callback. [`RecordingApplication`] remembers everything a controller is
//! told. Tests queue unsolicited traffic through `queue`.

use std::time::Instant;

use ofp_core::{Agent, Application, Outbox};
use ofp_proto::{
    Body, Capabilities, MessageType,
    payloads::{
        Desc, ErrorMsg, FeaturesReply, FlowMod, FlowRemoved, GroupMod, PacketIn, PacketOut, PortMod, PortStatus,
        QueueGetConfigReply, QueueGetConfigRequest, RoleMsg, StatsReply, StatsReplyBody, StatsRequest,
        StatsRequestBody, SwitchConfig, TableMod,
    },
};

/// One recorded callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `init` was called
    Init,
    /// `fini` was called
    Fini,
    /// A message callback ran
    Message {
        /// Kind of the message that triggered it
        kind: MessageType,
        /// Its transaction id
        xid: u32,
    },
}

/// Switch-side double.
#[derive(Debug)]
pub struct RecordingAgent {
    outbox: Outbox,
    events: Vec<Event>,
    /// Features reported to the controller
    pub features: FeaturesReply,
    /// Current switch configuration
    pub config: SwitchConfig,
    /// Description returned for desc stats requests
    pub desc: Desc,
    /// Every flow-mod received, in order
    pub flow_mods: Vec<FlowMod>,
    /// Every packet-out received, in order
    pub packet_outs: Vec<PacketOut>,
}

impl RecordingAgent {
    /// Agent reporting `datapath_id`
    pub fn new(datapath_id: u64) -> Self {
        Self {
            outbox: Outbox::new(),
            events: Vec::new(),
            features: FeaturesReply {
                datapath_id,
                n_buffers: 256,
                n_tables: 4,
                auxiliary_id: 0,
                capabilities: Capabilities::FLOW_STATS | Capabilities::TABLE_STATS | Capabilities::PORT_STATS,
            },
            config: SwitchConfig::default(),
            desc: Desc {
                mfr_desc: "ofp".into(),
                hw_desc: "simulated".into(),
                sw_desc: env!("CARGO_PKG_VERSION").into(),
                serial_num: format!("{datapath_id:016x}"),
                dp_desc: "harness datapath".into(),
            },
            flow_mods: Vec::new(),
            packet_outs: Vec::new(),
        }
    }

    /// Every callback so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// How many times a message of `kind` reached the agent
    pub fn count(&self, kind: MessageType) -> usize {
        count(&self.events, kind)
    }

    /// Queue an unsolicited message, e.g. a packet-in
    pub fn queue(&mut self, body: Body) -> u32 {
        self.outbox.send(body)
    }

    fn record(&mut self, kind: MessageType, xid: u32) {
        self.events.push(Event::Message { kind, xid });
    }
}

impl Default for RecordingAgent {
    fn default() -> Self {
        Self::new(1)
    }
}

fn count(events: &[Event], kind: MessageType) -> usize {
    events.iter().filter(|e| matches!(e, Event::Message { kind: k, .. } if *k == kind)).count()
}

impl Agent for RecordingAgent {
    fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    fn init(&mut self, _now: Instant) {
        self.events.push(Event::Init);
    }

    fn fini(&mut self, _now: Instant) {
        self.events.push(Event::Fini);
    }

    fn features_request(&mut self, _now: Instant, xid: u32) {
        self.record(MessageType::FeaturesRequest, xid);
        self.outbox.reply(xid, Body::FeaturesReply(self.features.clone()));
    }

    fn get_config_request(&mut self, _now: Instant, xid: u32) {
        self.record(MessageType::GetConfigRequest, xid);
        self.outbox.reply(xid, Body::GetConfigReply(self.config.clone()));
    }

    fn set_config(&mut self, _now: Instant, xid: u32, config: &SwitchConfig) {
        self.record(MessageType::SetConfig, xid);
        self.config = config.clone();
    }

    fn packet_out(&mut self, _now: Instant, xid: u32, packet: &PacketOut) {
        self.record(MessageType::PacketOut, xid);
        self.packet_outs.push(packet.clone());
    }

    fn flow_mod(&mut self, _now: Instant, xid: u32, flow_mod: &FlowMod) {
        self.record(MessageType::FlowMod, xid);
        self.flow_mods.push(flow_mod.clone());
    }

    fn group_mod(&mut self, _now: Instant, xid: u32, _group_mod: &GroupMod) {
        self.record(MessageType::GroupMod, xid);
    }

    fn port_mod(&mut self, _now: Instant, xid: u32, _port_mod: &PortMod) {
        self.record(MessageType::PortMod, xid);
    }

    fn table_mod(&mut self, _now: Instant, xid: u32, _table_mod: &TableMod) {
        self.record(MessageType::TableMod, xid);
    }

    fn stats_request(&mut self, _now: Instant, xid: u32, request: &StatsRequest) {
        self.record(MessageType::StatsRequest, xid);
        let body = match request.body.get() {
            Some(StatsRequestBody::Desc) => StatsReplyBody::Desc(self.desc.clone()),
            Some(StatsRequestBody::PortDesc) => StatsReplyBody::PortDesc(Default::default()),
            Some(StatsRequestBody::Table) => StatsReplyBody::Table(Default::default()),
            Some(StatsRequestBody::Flow(_)) => StatsReplyBody::Flow(Default::default()),
            Some(StatsRequestBody::PortStats(_)) => StatsReplyBody::PortStats(Default::default()),
            Some(StatsRequestBody::Aggregate(_)) => StatsReplyBody::Aggregate(Default::default()),
            None => return,
        };
        self.outbox.reply(xid, Body::StatsReply(StatsReply::new(body)));
    }

    fn barrier_request(&mut self, _now: Instant, xid: u32) {
        self.record(MessageType::BarrierRequest, xid);
        self.outbox.reply(xid, Body::BarrierReply);
    }

    fn queue_get_config_request(&mut self, _now: Instant, xid: u32, request: &QueueGetConfigRequest) {
        self.record(MessageType::QueueGetConfigRequest, xid);
        let reply = QueueGetConfigReply { port: request.port, queues: Default::default() };
        self.outbox.reply(xid, Body::QueueGetConfigReply(reply));
    }

    fn role_request(&mut self, _now: Instant, xid: u32, current: &RoleMsg) {
        self.record(MessageType::RoleRequest, xid);
        self.outbox.reply(xid, Body::RoleReply(current.clone()));
    }
}

/// Controller-side double.
#[derive(Debug, Default)]
pub struct RecordingApplication {
    outbox: Outbox,
    events: Vec<Event>,
    /// Every error the switch reported
    pub errors: Vec<ErrorMsg>,
    /// Every role reply
    pub roles: Vec<RoleMsg>,
    /// Every stats reply part
    pub stats: Vec<StatsReply>,
    /// Every packet-in
    pub packet_ins: Vec<PacketIn>,
}

impl RecordingApplication {
    /// Empty application
    pub fn new() -> Self {
        Self::default()
    }

    /// Every callback so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// How many messages of `kind` reached the application
    pub fn count(&self, kind: MessageType) -> usize {
        count(&self.events, kind)
    }

    /// Queue a command or request. Returns its xid.
    pub fn queue(&mut self, body: Body) -> u32 {
        self.outbox.send(body)
    }

    fn record(&mut self, kind: MessageType, xid: u32) {
        self.events.push(Event::Message { kind, xid });
    }
}

impl Application for RecordingApplication {
    fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    fn init(&mut self, _now: Instant) {
        self.events.push(Event::Init);
    }

    fn fini(&mut self, _now: Instant) {
        self.events.push(Event::Fini);
    }

    fn error(&mut self, _now: Instant, xid: u32, error: &ErrorMsg) {
        self.record(MessageType::Error, xid);
        self.errors.push(error.clone());
    }

    fn features_reply(&mut self, _now: Instant, xid: u32, _features: &FeaturesReply) {
        self.record(MessageType::FeaturesReply, xid);
    }

    fn get_config_reply(&mut self, _now: Instant, xid: u32, _config: &SwitchConfig) {
        self.record(MessageType::GetConfigReply, xid);
    }

    fn packet_in(&mut self, _now: Instant, xid: u32, packet: &PacketIn) {
        self.record(MessageType::PacketIn, xid);
        self.packet_ins.push(packet.clone());
    }

    fn flow_removed(&mut self, _now: Instant, xid: u32, _removed: &FlowRemoved) {
        self.record(MessageType::FlowRemoved, xid);
    }

    fn port_status(&mut self, _now: Instant, xid: u32, _status: &PortStatus) {
        self.record(MessageType::PortStatus, xid);
    }

    fn stats_reply(&mut self, _now: Instant, xid: u32, reply: &StatsReply) {
        self.record(MessageType::StatsReply, xid);
        self.stats.push(reply.clone());
    }

    fn barrier_reply(&mut self, _now: Instant, xid: u32) {
        self.record(MessageType::BarrierReply, xid);
    }

    fn role_reply(&mut self, _now: Instant, xid: u32, reply: &RoleMsg) {
        self.record(MessageType::RoleReply, xid);
        self.roles.push(reply.clone());
    }

    fn queue_get_config_reply(&mut self, _now: Instant, xid: u32, _reply: &QueueGetConfigReply) {
        self.record(MessageType::QueueGetConfigReply, xid);
    }
}
