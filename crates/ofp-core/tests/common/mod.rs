//! Minimal collaborators shared by the integration tests.
#![allow(dead_code)]

use std::time::Instant;

use ofp_core::{Agent, Application, Outbox};
use ofp_proto::{
    Body,
    payloads::{
        ErrorMsg, FeaturesReply, FlowMod, FlowRemoved, GroupMod, PacketIn, PacketOut, PortMod, PortStatus,
        QueueGetConfigReply, QueueGetConfigRequest, RoleMsg, StatsReply, StatsRequest, SwitchConfig, TableMod,
    },
};

/// Agent that answers features, config, barrier and role requests and
/// counts everything else
#[derive(Default)]
pub struct EchoAgent {
    pub outbox: Outbox,
    pub commands: usize,
}

impl Agent for EchoAgent {
    fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    fn init(&mut self, _now: Instant) {}

    fn fini(&mut self, _now: Instant) {}

    fn features_request(&mut self, _now: Instant, xid: u32) {
        let features = FeaturesReply { datapath_id: 1, n_tables: 1, ..Default::default() };
        self.outbox.reply(xid, Body::FeaturesReply(features));
    }

    fn get_config_request(&mut self, _now: Instant, xid: u32) {
        self.outbox.reply(xid, Body::GetConfigReply(SwitchConfig::default()));
    }

    fn set_config(&mut self, _now: Instant, _xid: u32, _config: &SwitchConfig) {
        self.commands += 1;
    }

    fn packet_out(&mut self, _now: Instant, _xid: u32, _packet: &PacketOut) {
        self.commands += 1;
    }

    fn flow_mod(&mut self, _now: Instant, _xid: u32, _flow_mod: &FlowMod) {
        self.commands += 1;
    }

    fn group_mod(&mut self, _now: Instant, _xid: u32, _group_mod: &GroupMod) {
        self.commands += 1;
    }

    fn port_mod(&mut self, _now: Instant, _xid: u32, _port_mod: &PortMod) {
        self.commands += 1;
    }

    fn table_mod(&mut self, _now: Instant, _xid: u32, _table_mod: &TableMod) {
        self.commands += 1;
    }

    fn stats_request(&mut self, _now: Instant, _xid: u32, _request: &StatsRequest) {
        self.commands += 1;
    }

    fn barrier_request(&mut self, _now: Instant, xid: u32) {
        self.outbox.reply(xid, Body::BarrierReply);
    }

    fn queue_get_config_request(&mut self, _now: Instant, _xid: u32, _request: &QueueGetConfigRequest) {
        self.commands += 1;
    }

    fn role_request(&mut self, _now: Instant, xid: u32, current: &RoleMsg) {
        self.outbox.reply(xid, Body::RoleReply(current.clone()));
    }
}

/// Application that only counts callbacks
#[derive(Default)]
pub struct CountingApp {
    pub outbox: Outbox,
    pub callbacks: usize,
}

impl Application for CountingApp {
    fn outbox(&mut self) -> &mut Outbox {
        &mut self.outbox
    }

    fn init(&mut self, _now: Instant) {}

    fn fini(&mut self, _now: Instant) {}

    fn error(&mut self, _now: Instant, _xid: u32, _error: &ErrorMsg) {
        self.callbacks += 1;
    }

    fn features_reply(&mut self, _now: Instant, _xid: u32, _features: &FeaturesReply) {
        self.callbacks += 1;
    }

    fn get_config_reply(&mut self, _now: Instant, _xid: u32, _config: &SwitchConfig) {
        self.callbacks += 1;
    }

    fn packet_in(&mut self, _now: Instant, _xid: u32, _packet: &PacketIn) {
        self.callbacks += 1;
    }

    fn flow_removed(&mut self, _now: Instant, _xid: u32, _removed: &FlowRemoved) {
        self.callbacks += 1;
    }

    fn port_status(&mut self, _now: Instant, _xid: u32, _status: &PortStatus) {
        self.callbacks += 1;
    }

    fn stats_reply(&mut self, _now: Instant, _xid: u32, _reply: &StatsReply) {
        self.callbacks += 1;
    }

    fn barrier_reply(&mut self, _now: Instant, _xid: u32) {
        self.callbacks += 1;
    }

    fn role_reply(&mut self, _now: Instant, _xid: u32, _reply: &RoleMsg) {
        self.callbacks += 1;
    }

    fn queue_get_config_reply(&mut self, _now: Instant, _xid: u32, _reply: &QueueGetConfigReply) {
        self.callbacks += 1;
    }
}
