//! Structured round trips over a catalog of messages.
//!
//! The input picks a message shape and edge values for its fields; every
//! combination must encode, decode to an equal message and report the
//! encoded length in its header.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use ofp_proto::{
    Action, ActionBody, Body, Instruction, InstructionBody, Match, Message, OxmField, Wire,
    action::Output,
    instruction::Actions,
    payloads::{Echo, FlowMod, QueueGetConfigRequest, Role, RoleMsg, StatsRequest, StatsRequestBody, SwitchConfig},
};

const XIDS: &[u32] = &[0, 1, 0x1000, u32::MAX / 2, u32::MAX - 1, u32::MAX];

const U64_EDGES: &[u64] = &[0, 1, u32::MAX as u64, u64::MAX / 2, u64::MAX - 1, u64::MAX];

const DATA_SIZES: &[usize] = &[0, 1, 7, 8, 64, 1024];

fn body(selector: u8, value: u64, data: Bytes) -> Body {
    let port = value as u32;
    match selector % 10 {
        0 => Body::EchoRequest(Echo { data }),
        1 => Body::EchoReply(Echo { data }),
        2 => Body::RoleRequest(RoleMsg { role: Role::Master, generation_id: value }),
        3 => Body::RoleReply(RoleMsg { role: Role::Slave, generation_id: value }),
        4 => Body::SetConfig(SwitchConfig { miss_send_len: value as u16, ..Default::default() }),
        5 => Body::QueueGetConfigRequest(QueueGetConfigRequest { port }),
        6 => Body::StatsRequest(StatsRequest::new(StatsRequestBody::Desc)),
        7 => {
            let output = Action::new(ActionBody::Output(Output { port, max_len: 0xffff }));
            let apply = Instruction::new(InstructionBody::ApplyActions(Actions::new([output])));
            Body::FlowMod(FlowMod::add(value as u8, Match::new([OxmField::in_port(port)]), [apply]))
        },
        8 => Body::BarrierRequest,
        _ => Body::FeaturesRequest,
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let selector = data[0];
    let value = U64_EDGES[usize::from(data[1]) % U64_EDGES.len()];
    let size = DATA_SIZES[usize::from(data[2]) % DATA_SIZES.len()];
    let payload = match data.get(3..3 + size) {
        Some(bytes) => Bytes::copy_from_slice(bytes),
        None => Bytes::from(vec![0u8; size]),
    };

    for &xid in XIDS {
        let message = Message::with_xid(xid, body(selector, value, payload.clone()));
        if message.validate().is_err() {
            continue;
        }

        let encoded = message.to_bytes().expect("valid message must encode");
        assert_eq!(Message::peek_length(&encoded), Some(encoded.len()), "length mismatch for {message:?}");

        let decoded = Message::from_bytes(&encoded).expect("own encoding must decode");
        assert_eq!(decoded, message);
        assert_eq!(decoded.xid(), xid);
    }
});
