//! Snapshot tests for wire format stability.
//!
//! Each message is rendered as hex, eight bytes per row. If an encoding
//! changes, these fail before a peer notices.

use bytes::Bytes;
use insta::assert_snapshot;
use ofp_proto::{
    Action, ActionBody, Body, Capabilities, ConfigFlags, Instruction, InstructionBody, Match, Message, OxmField,
    action::Output,
    instruction::Actions,
    payloads::{
        Echo, ErrorMsg, FeaturesReply, FlowMod, Hello, PacketOut, PortStatsRequest, Role, RoleMsg, StatsRequest,
        StatsRequestBody, SwitchConfig,
    },
    types::port_no,
};

fn hex_rows(msg: &Message) -> String {
    let bytes = msg.to_bytes().expect("encoding should succeed");
    bytes.chunks(8).map(hex::encode).collect::<Vec<_>>().join("\n")
}

// =============================================================================
// Handshake and keepalive
// =============================================================================

#[test]
fn snapshot_hello() {
    let msg = Message::with_xid(1, Body::Hello(Hello::default()));
    assert_snapshot!(hex_rows(&msg), @"0400000800000001");
}

#[test]
fn snapshot_features_request() {
    let msg = Message::with_xid(2, Body::FeaturesRequest);
    assert_snapshot!(hex_rows(&msg), @"0405000800000002");
}

#[test]
fn snapshot_echo_request() {
    let msg = Message::with_xid(3, Body::EchoRequest(Echo { data: Bytes::from_static(b"ab") }));
    assert_snapshot!(hex_rows(&msg), @r"
    0402000a00000003
    6162
    ");
}

#[test]
fn snapshot_features_reply() {
    let msg = Message::with_xid(
        2,
        Body::FeaturesReply(FeaturesReply {
            datapath_id: 0x0102_0304_0506_0708,
            n_buffers: 256,
            n_tables: 4,
            auxiliary_id: 0,
            capabilities: Capabilities::FLOW_STATS | Capabilities::PORT_STATS,
        }),
    );
    assert_snapshot!(hex_rows(&msg), @r"
    0406002000000002
    0102030405060708
    0000010004000000
    0000000500000000
    ");
}

// =============================================================================
// Configuration and roles
// =============================================================================

#[test]
fn snapshot_set_config() {
    let msg = Message::with_xid(4, Body::SetConfig(SwitchConfig { flags: ConfigFlags::FRAG_REASM, miss_send_len: 128 }));
    assert_snapshot!(hex_rows(&msg), @r"
    0409000c00000004
    00020080
    ");
}

#[test]
fn snapshot_role_request() {
    let msg = Message::with_xid(5, Body::RoleRequest(RoleMsg { role: Role::Master, generation_id: 7 }));
    assert_snapshot!(hex_rows(&msg), @r"
    0418001800000005
    0000000200000000
    0000000000000007
    ");
}

#[test]
fn snapshot_is_slave_error() {
    let rejected = Message::with_xid(9, Body::BarrierRequest).to_bytes().unwrap();
    let msg = Message::with_xid(6, Body::Error(ErrorMsg::is_slave(&rejected)));
    assert_snapshot!(hex_rows(&msg), @r"
    0401001400000006
    0001000a04140008
    00000009
    ");
}

// =============================================================================
// Flow programming
// =============================================================================

#[test]
fn snapshot_flow_mod() {
    let apply = Instruction::new(InstructionBody::ApplyActions(Actions::new([Action::new(ActionBody::Output(
        Output { port: 2, max_len: 0 },
    ))])));
    let msg = Message::with_xid(10, Body::FlowMod(FlowMod::add(0, Match::new([OxmField::in_port(1)]), [apply])));
    assert_snapshot!(hex_rows(&msg), @r"
    040e00580000000a
    0000000000000000
    0000000000000000
    0000000000008000
    ffffffffffffffff
    ffffffff00000000
    0001000c80000004
    0000000100000000
    0004001800000000
    0000001000000002
    0000000000000000
    ");
}

#[test]
fn snapshot_packet_out() {
    let out = PacketOut {
        actions: [Action::new(ActionBody::Output(Output { port: port_no::FLOOD, max_len: 0 }))].into_iter().collect(),
        data: Bytes::from_static(&[1, 2]),
        ..PacketOut::default()
    };
    let msg = Message::with_xid(11, Body::PacketOut(out));
    assert_snapshot!(hex_rows(&msg), @r"
    040d002a0000000b
    fffffffffffffffd
    0010000000000000
    00000010fffffffb
    0000000000000000
    0102
    ");
}

// =============================================================================
// Statistics
// =============================================================================

#[test]
fn snapshot_port_desc_request() {
    let msg = Message::with_xid(12, Body::StatsRequest(StatsRequest::new(StatsRequestBody::PortDesc)));
    assert_snapshot!(hex_rows(&msg), @r"
    041200100000000c
    000d000000000000
    ");
}

#[test]
fn snapshot_port_stats_request() {
    let body = StatsRequestBody::PortStats(PortStatsRequest { port_no: 3 });
    let msg = Message::with_xid(13, Body::StatsRequest(StatsRequest::new(body)));
    assert_snapshot!(hex_rows(&msg), @r"
    041200180000000d
    0004000000000000
    0000000300000000
    ");
}

#[test]
fn snapshot_display() {
    let msg = Message::with_xid(12, Body::StatsRequest(StatsRequest::new(StatsRequestBody::Table)));
    assert_snapshot!(msg.to_string(), @"stats-request (xid=12, 16 bytes)");
}
