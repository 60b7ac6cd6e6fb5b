//! Property-based tests for the message codec.
//!
//! - Encoding then decoding yields the same message
//! - Any strict prefix of a message is an `Available` fault
//! - A header length off by one never decodes, with exact faults for
//!   fixed-size bodies
//! - Arbitrary bytes never panic the decoder

use bytes::Bytes;
use ofp_proto::{
    Action, ActionBody, Body, ConfigFlags, FlowModFlags, Instruction, InstructionBody, Item, Match, Message, OxmField,
    ProtocolError, Wire,
    action::{Output, SetQueue},
    instruction::{Actions, GotoTable, WriteMetadata},
    payloads::{
        Echo, FlowMod, FlowModCommand, PacketOut, PortMod, PortStatsRequest, Role, RoleMsg, StatsRequest,
        StatsRequestBody, SwitchConfig, TableMod,
    },
};
use proptest::prelude::*;

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1u32..=0xff00, any::<u16>()).prop_map(|(port, max_len)| ActionBody::Output(Output { port, max_len })),
        any::<u32>().prop_map(|queue_id| ActionBody::SetQueue(SetQueue { queue_id })),
        Just(ActionBody::PopVlan),
        Just(ActionBody::DecNwTtl),
    ]
    .prop_map(Action::new)
}

fn match_strategy() -> impl Strategy<Value = Match> {
    (proptest::option::of(1u32..64), proptest::option::of(any::<u16>())).prop_map(|(port, ethertype)| {
        Match::new(port.map(OxmField::in_port).into_iter().chain(ethertype.map(OxmField::eth_type)))
    })
}

fn instructions_strategy() -> impl Strategy<Value = Vec<Instruction>> {
    (
        proptest::collection::vec(action_strategy(), 0..4),
        proptest::option::of((any::<u64>(), any::<u64>())),
        proptest::option::of(1u8..=0xfe),
    )
        .prop_map(|(actions, metadata, goto)| {
            let mut list = vec![Instruction::new(InstructionBody::ApplyActions(Actions::new(actions)))];
            if let Some((metadata, mask)) = metadata {
                list.push(Instruction::new(InstructionBody::WriteMetadata(WriteMetadata { metadata, mask })));
            }
            if let Some(table_id) = goto {
                list.push(Instruction::new(InstructionBody::GotoTable(GotoTable { table_id })));
            }
            list
        })
}

fn flow_mod_strategy() -> impl Strategy<Value = FlowMod> {
    (any::<u64>(), any::<u16>(), 0u8..=4, match_strategy(), instructions_strategy()).prop_map(
        |(cookie, priority, command, pattern, instructions)| FlowMod {
            cookie,
            priority,
            command: [
                FlowModCommand::Add,
                FlowModCommand::Modify,
                FlowModCommand::ModifyStrict,
                FlowModCommand::Delete,
                FlowModCommand::DeleteStrict,
            ][usize::from(command)],
            flags: FlowModFlags::SEND_FLOW_REM,
            pattern,
            instructions: instructions.into_iter().collect(),
            ..FlowMod::default()
        },
    )
}

/// Bodies whose layout is fully determined by their fields: none of them
/// ends in an open-ended byte run.
fn fixed_body_strategy() -> impl Strategy<Value = Body> {
    prop_oneof![
        flow_mod_strategy().prop_map(Body::FlowMod),
        (any::<u64>(), 1u32..=3).prop_map(|(generation_id, role)| {
            let role = [Role::Equal, Role::Master, Role::Slave][role as usize - 1];
            Body::RoleRequest(RoleMsg { role, generation_id })
        }),
        any::<u16>().prop_map(|miss_send_len| Body::SetConfig(SwitchConfig {
            flags: ConfigFlags::FRAG_DROP,
            miss_send_len
        })),
        (1u32..0xff00).prop_map(|port_no| Body::PortMod(PortMod { port_no, ..PortMod::default() })),
        (any::<u8>(), 0u32..4).prop_map(|(table_id, config)| Body::TableMod(TableMod { table_id, config })),
        any::<u32>().prop_map(|port_no| Body::StatsRequest(StatsRequest::new(StatsRequestBody::PortStats(
            PortStatsRequest { port_no }
        )))),
    ]
}

fn body_strategy() -> impl Strategy<Value = Body> {
    prop_oneof![
        fixed_body_strategy(),
        proptest::collection::vec(any::<u8>(), 0..64)
            .prop_map(|data| Body::EchoRequest(Echo { data: Bytes::from(data) })),
        (proptest::collection::vec(action_strategy(), 0..4), proptest::collection::vec(any::<u8>(), 0..32)).prop_map(
            |(actions, data)| Body::PacketOut(PacketOut {
                actions: actions.into_iter().collect(),
                data: data.into(),
                ..PacketOut::default()
            })
        ),
        Just(Body::BarrierRequest),
        Just(Body::FeaturesRequest),
    ]
}

fn message_strategy(body: impl Strategy<Value = Body>) -> impl Strategy<Value = Message> {
    (any::<u32>(), body).prop_map(|(xid, body)| Message::with_xid(xid, body))
}

fn with_length(bytes: &[u8], length: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out[2..4].copy_from_slice(&u16::try_from(length).unwrap().to_be_bytes());
    out
}

proptest! {
    #[test]
    fn prop_round_trip(msg in message_strategy(body_strategy())) {
        let bytes = msg.to_bytes().unwrap();
        prop_assert_eq!(bytes.len(), msg.bytes());
        prop_assert_eq!(Message::from_bytes(&bytes).unwrap(), msg);
    }

    #[test]
    fn prop_prefix_is_available(msg in message_strategy(body_strategy()), cut in any::<prop::sample::Index>()) {
        let bytes = msg.to_bytes().unwrap();
        let prefix = &bytes[..cut.index(bytes.len())];
        let err = Message::from_bytes(prefix).unwrap_err();
        prop_assert!(err.is_available(), "{err:?}");
    }

    #[test]
    fn prop_length_off_by_one_fails(msg in message_strategy(fixed_body_strategy())) {
        let bytes = msg.to_bytes().unwrap();

        let mut longer = with_length(&bytes, bytes.len() + 1);
        longer.push(0);
        let err = Message::from_bytes(&longer).unwrap_err();
        prop_assert!(err.is_available() || err.is_excess(), "{err:?}");

        let shorter = with_length(&bytes, bytes.len() - 1);
        let err = Message::from_bytes(&shorter).unwrap_err();
        prop_assert!(err.is_available() || err.is_excess(), "{err:?}");
    }

    #[test]
    fn prop_fixed_length_off_by_one_is_exact(
        (body, short) in prop_oneof![
            (any::<u64>(), 1u32..=3).prop_map(|(generation_id, role)| {
                let role = [Role::Equal, Role::Master, Role::Slave][role as usize - 1];
                (Body::RoleRequest(RoleMsg { role, generation_id }), ProtocolError::Available(Item::Role))
            }),
            any::<u16>().prop_map(|miss_send_len| {
                let config = SwitchConfig { flags: ConfigFlags::empty(), miss_send_len };
                (Body::SetConfig(config), ProtocolError::Available(Item::SwitchConfig))
            }),
            Just((Body::BarrierRequest, ProtocolError::Bad(Item::MessageHeader))),
        ],
        xid in any::<u32>(),
    ) {
        let bytes = Message::with_xid(xid, body).to_bytes().unwrap();

        // the payload parses, then one byte is left over
        let mut longer = with_length(&bytes, bytes.len() + 1);
        longer.push(0);
        prop_assert_eq!(Message::from_bytes(&longer).unwrap_err(), ProtocolError::Excess(Item::Message));

        let shorter = with_length(&bytes, bytes.len() - 1);
        prop_assert_eq!(Message::from_bytes(&shorter).unwrap_err(), short);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = Message::from_bytes(&bytes);
    }

    #[test]
    fn prop_arbitrary_bodies_never_panic(
        msg_type in 0u8..=25,
        body in proptest::collection::vec(any::<u8>(), 0..200),
    ) {
        let mut bytes = vec![0x04, msg_type];
        bytes.extend_from_slice(&u16::try_from(body.len() + 8).unwrap().to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 1]);
        bytes.extend_from_slice(&body);
        match Message::from_bytes(&bytes) {
            Ok(msg) => prop_assert_eq!(msg.to_bytes().unwrap().len(), bytes.len()),
            Err(ProtocolError::Available(_) | ProtocolError::Bad(_) | ProtocolError::Excess(_)) => {},
        }
    }
}
