//! Chaos property tests for the connection state machines
//!
//! Both peers are fed arbitrary bytes, arbitrary message sequences and
//! arbitrary clock ticks. Whatever happens:
//! - Nothing panics
//! - `proceed == false` exactly when the peer is `Failed`
//! - A failed peer has a recorded failure and no timers
//! - The state never moves backwards without `fini`

mod common;

use std::time::{Duration, Instant};

use bytes::Bytes;
use common::{CountingApp, EchoAgent};
use ofp_core::{ConnectionConfig, Controller, Outcome, Peer, State, Switch};
use ofp_proto::{
    Body, Match, Message,
    payloads::{Echo, FlowMod, Role, RoleMsg},
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Input {
    Bytes(Vec<u8>),
    Message(u32, u8),
    Tick(u64),
    Poll,
}

fn body_for(selector: u8) -> Body {
    match selector % 10 {
        0 => Body::FeaturesRequest,
        1 => Body::BarrierRequest,
        2 => Body::EchoRequest(Echo { data: Bytes::from_static(b"x") }),
        3 => Body::EchoReply(Echo::default()),
        4 => Body::FlowMod(FlowMod::add(0, Match::default(), [])),
        5 => Body::RoleRequest(RoleMsg { role: Role::Slave, generation_id: u64::from(selector) }),
        6 => Body::RoleRequest(RoleMsg { role: Role::Master, generation_id: u64::from(selector) }),
        7 => Body::Hello(Default::default()),
        8 => Body::BarrierReply,
        _ => Body::GetConfigRequest,
    }
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Input::Bytes),
        (any::<u32>(), any::<u8>()).prop_map(|(xid, selector)| Input::Message(xid, selector)),
        (0u64..20_000).prop_map(Input::Tick),
        Just(Input::Poll),
    ]
}

fn rank(state: State) -> u8 {
    match state {
        State::Idle => 0,
        State::FeatureWait => 1,
        State::Established => 2,
        State::Failed => 3,
    }
}

fn check(peer: &impl Peer, outcome: &Outcome, before: State) -> Result<(), TestCaseError> {
    let state = peer.state();
    prop_assert_eq!(outcome.proceed, state != State::Failed, "proceed disagrees with {}", state);
    prop_assert!(rank(state) >= rank(before), "went from {} back to {}", before, state);
    if state == State::Failed {
        prop_assert!(peer.failure().is_some());
        prop_assert!(outcome.messages.is_empty());
        prop_assert_eq!(peer.next_deadline(), None);
    }
    Ok(())
}

fn run(peer: &mut impl Peer, inputs: Vec<Input>) -> Result<(), TestCaseError> {
    let mut now = Instant::now();
    let before = peer.state();
    let outcome = peer.init(now);
    check(&*peer, &outcome, before)?;

    for input in inputs {
        let before = peer.state();
        let outcome = match input {
            Input::Bytes(bytes) => peer.recv_bytes(now, &bytes),
            Input::Message(xid, selector) => peer.recv(now, Message::with_xid(xid, body_for(selector))),
            Input::Tick(ms) => {
                now += Duration::from_millis(ms);
                peer.time(now)
            },
            Input::Poll => peer.poll(now),
        };
        check(&*peer, &outcome, before)?;
        prop_assert!(outcome.encode().is_ok());
    }

    let _ = peer.fini(now);
    prop_assert_eq!(peer.state(), State::Idle);
    Ok(())
}

proptest! {
    #[test]
    fn prop_switch_survives_chaos(inputs in proptest::collection::vec(input_strategy(), 1..40)) {
        let mut switch = Switch::new(EchoAgent::default(), ConnectionConfig::default()).unwrap();
        run(&mut switch, inputs)?;
    }

    #[test]
    fn prop_controller_survives_chaos(inputs in proptest::collection::vec(input_strategy(), 1..40)) {
        let mut controller = Controller::new(CountingApp::default(), ConnectionConfig::default()).unwrap();
        run(&mut controller, inputs)?;
    }

    #[test]
    fn prop_slave_never_forwards_commands(count in 1usize..10) {
        let now = Instant::now();
        let mut switch = Switch::new(EchoAgent::default(), ConnectionConfig::default()).unwrap();
        let _ = switch.init(now);
        let _ = switch.recv(now, Message::with_xid(1, Body::FeaturesRequest));
        let _ = switch.recv(now, Message::with_xid(2, body_for(5)));

        for xid in 0..count {
            let outcome = switch.recv(now, Message::with_xid(xid as u32 + 10, body_for(4)));
            prop_assert_eq!(outcome.kinds(), vec![ofp_proto::MessageType::Error]);
        }
        prop_assert_eq!(switch.agent().commands, 0);
    }
}
