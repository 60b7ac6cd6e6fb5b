//! Scenario tests for feature negotiation and request/reply traffic.
//!
//! Each scenario starts a switch and a controller over the in-memory link;
//! the handshake runs before any queued request is sent.

use ofp_core::{Peer, State};
use ofp_harness::{
    Link, RecordingAgent, SimEnv,
    scenario::{Scenario, oracle},
};
use ofp_proto::{
    Body, ConfigFlags, Match, MessageType, OxmField,
    payloads::{
        FlowMod, PacketIn, QueueGetConfigRequest, StatsReplyBody, StatsRequest, StatsRequestBody, SwitchConfig,
    },
};

#[test]
fn scenario_handshake_establishes_both_ends() {
    let result = Scenario::new()
        .oracle(oracle::all_of(vec![
            oracle::all_established(),
            oracle::features_match(),
            oracle::no_failures(),
            Box::new(|world| {
                if world.controller_counters().sent != 1 {
                    return Err(format!(
                        "controller should have sent 1 message, got {}",
                        world.controller_counters().sent
                    ));
                }
                if world.switch_counters().sent != 1 {
                    return Err(format!(
                        "switch should have sent 1 message, got {}",
                        world.switch_counters().sent
                    ));
                }
                if world.application().count(MessageType::FeaturesReply) != 1 {
                    return Err("application should see the features reply once".into());
                }
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn scenario_features_come_from_agent() {
    let mut agent = RecordingAgent::new(0x00de_adbe_ef00);
    agent.features.n_tables = 254;

    let result = Scenario::new()
        .with_agent(agent)
        .oracle(Box::new(|world| {
            let features = world.controller().features().ok_or("controller has no features")?;
            assert_eq!(features.datapath_id, 0x00de_adbe_ef00);
            assert_eq!(features.n_tables, 254);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn scenario_requests_are_answered() {
    let result = Scenario::new()
        .with_request(Body::BarrierRequest)
        .with_request(Body::GetConfigRequest)
        .with_request(Body::StatsRequest(StatsRequest::new(StatsRequestBody::Desc)))
        .with_request(Body::QueueGetConfigRequest(QueueGetConfigRequest { port: 3 }))
        .oracle(Box::new(|world| {
            let app = world.application();
            for kind in [
                MessageType::BarrierReply,
                MessageType::GetConfigReply,
                MessageType::StatsReply,
                MessageType::QueueGetConfigReply,
            ] {
                if app.count(kind) != 1 {
                    return Err(format!("expected one {kind}, got {}", app.count(kind)));
                }
            }
            if !world.controller().timers().is_empty() {
                return Err(format!("{} request timers still armed", world.controller().timers().len()));
            }
            let desc = app.stats.first().and_then(|reply| reply.body.get());
            if !matches!(desc, Some(StatsReplyBody::Desc(d)) if d.dp_desc == "harness datapath") {
                return Err(format!("unexpected stats reply {desc:?}"));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn scenario_commands_reach_agent() {
    let flow = FlowMod::add(0, Match::new([OxmField::in_port(1), OxmField::eth_type(0x0800)]), []);
    let config = SwitchConfig { flags: ConfigFlags::FRAG_DROP, miss_send_len: 128 };

    let result = Scenario::new()
        .with_request(Body::FlowMod(flow.clone()))
        .with_request(Body::SetConfig(config.clone()))
        .oracle(Box::new(move |world| {
            let agent = world.agent();
            assert_eq!(agent.flow_mods, vec![flow]);
            assert_eq!(agent.config, config);
            assert!(world.application().errors.is_empty());
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn link_forwards_unsolicited_packet_in() {
    let mut link = Link::new(SimEnv::new());
    link.start().unwrap();

    let packet = PacketIn { pattern: Match::new([OxmField::in_port(2)]), ..Default::default() };
    link.switch_mut().agent_mut().queue(Body::PacketIn(packet.clone()));
    link.pump().unwrap();

    assert_eq!(link.controller().application().packet_ins, vec![packet]);
    assert_eq!(link.controller().state(), State::Established);
}
