//! Scenario tests for keepalive and timeout behavior.
//!
//! Time advances in one-second steps so each keepalive deadline is seen
//! close to when it falls due.

use std::time::Duration;

use ofp_core::{ConnectionConfig, ConnectionError, Peer, State};
use ofp_harness::{
    End, Faults, Link, SimEnv,
    scenario::{Scenario, oracle},
};
use ofp_proto::{Body, MessageType};

const STEP: Duration = Duration::from_secs(1);

#[test]
fn scenario_keepalives_keep_connection_up() {
    let result = Scenario::new()
        .with_time_advance(Duration::from_secs(60))
        .with_step(STEP)
        .oracle(oracle::all_of(vec![
            oracle::all_established(),
            oracle::no_failures(),
            Box::new(|world| {
                // handshake plus four rounds of echo at a 15 s interval
                let switch = world.switch_counters();
                let controller = world.controller_counters();
                if switch.sent < 5 || controller.sent < 5 {
                    return Err(format!("expected keepalive traffic, got {switch:?} and {controller:?}"));
                }
                if !world.switch().timers().is_empty() || !world.controller().timers().is_empty() {
                    return Err("echo timers left armed".into());
                }
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn scenario_lost_echo_replies_fail_both_ends() {
    let config = ConnectionConfig::default();
    let deadline = config.keepalive_interval + config.keepalive_timeout;

    let result = Scenario::new()
        .with_faults(Faults { drop: 1.0, ..Faults::NONE })
        .with_time_advance(deadline)
        .with_step(STEP)
        .oracle(Box::new(|world| {
            assert_eq!(world.switch().state(), State::Failed);
            assert_eq!(world.controller().state(), State::Failed);
            assert!(matches!(world.switch().failure(), Some(ConnectionError::KeepaliveTimeout { .. })));
            assert!(matches!(world.controller().failure(), Some(ConnectionError::KeepaliveTimeout { .. })));
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn scenario_unanswered_request_is_not_fatal() {
    let config = ConnectionConfig {
        keepalive_interval: Duration::from_secs(300),
        request_timeout: Duration::from_secs(10),
        ..Default::default()
    };

    let result = Scenario::new()
        .with_switch_config(config.clone())
        .with_controller_config(config)
        .with_faults(Faults { drop: 1.0, ..Faults::NONE })
        .with_request(Body::BarrierRequest)
        .with_time_advance(Duration::from_secs(11))
        .with_step(STEP)
        .oracle(Box::new(|world| {
            assert_eq!(world.controller().state(), State::Established);
            assert!(world.controller().timers().is_empty());
            assert_eq!(world.application().count(MessageType::BarrierReply), 0);
            assert_eq!(world.controller_counters().dropped, 1);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn lost_features_request_times_out() {
    let mut link = Link::new(SimEnv::with_seed(5));
    link.set_faults(Faults { drop: 1.0, ..Faults::NONE });
    link.start().unwrap();

    let wait = ConnectionConfig::default().feature_wait;
    link.run_for(wait - STEP, STEP).unwrap();
    assert_eq!(link.switch().state(), State::FeatureWait);
    assert_eq!(link.controller().state(), State::FeatureWait);

    link.advance(STEP).unwrap();
    assert!(matches!(link.switch().failure(), Some(ConnectionError::FeatureTimeout { .. })));
    assert!(matches!(link.controller().failure(), Some(ConnectionError::FeatureTimeout { .. })));
    assert_eq!(link.counters(End::Switch).received, 0);
}
