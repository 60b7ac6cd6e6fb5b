//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use std::time::Duration;

use ofp_core::{ConnectionConfig, Controller, Switch};
use ofp_proto::Body;

use crate::{
    link::{Faults, Link},
    recording::{RecordingAgent, RecordingApplication},
    scenario::{OracleFn, World},
    sim_env::SimEnv,
};

/// Scenario builder.
///
/// Configure both ends, optionally queue controller requests and advance
/// time, then add an oracle. A scenario without an oracle cannot run.
pub struct Scenario {
    switch_config: ConnectionConfig,
    controller_config: ConnectionConfig,
    agent: RecordingAgent,
    seed: u64,
    faults: Faults,
    requests: Vec<Body>,
    time_advance: Option<Duration>,
    step: Option<Duration>,
}

impl Scenario {
    /// Create a new scenario with default configuration.
    pub fn new() -> Self {
        Self {
            switch_config: ConnectionConfig::default(),
            controller_config: ConnectionConfig::default(),
            agent: RecordingAgent::default(),
            seed: 0,
            faults: Faults::NONE,
            requests: Vec::new(),
            time_advance: None,
            step: None,
        }
    }

    /// Configure the switch connection.
    pub fn with_switch_config(mut self, config: ConnectionConfig) -> Self {
        self.switch_config = config;
        self
    }

    /// Configure the controller connection.
    pub fn with_controller_config(mut self, config: ConnectionConfig) -> Self {
        self.controller_config = config;
        self
    }

    /// Use a prepared switch agent
    pub fn with_agent(mut self, agent: RecordingAgent) -> Self {
        self.agent = agent;
        self
    }

    /// Seed for the fault RNG
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Disturb messages once the handshake is done
    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    /// Send `body` from the controller after the handshake
    pub fn with_request(mut self, body: Body) -> Self {
        self.requests.push(body);
        self
    }

    /// Advance virtual time after the requests have settled.
    ///
    /// Both ends are ticked at the end of the advance, or every `step` if
    /// [`with_step`](Self::with_step) is set, and the link settles after
    /// each tick before the oracle runs.
    pub fn with_time_advance(mut self, duration: Duration) -> Self {
        self.time_advance = Some(duration);
        self
    }

    /// Tick granularity for [`with_time_advance`](Self::with_time_advance)
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// 1. Both ends start and exchange features over the link
    /// 2. Faults are switched on
    /// 3. Queued requests are sent and the link settles
    /// 4. Time advances, if requested
    ///
    /// Finally, the oracle is invoked to verify global consistency.
    pub fn run(self) -> Result<(), String> {
        let Scenario { switch_config, controller_config, agent, seed, faults, requests, time_advance, step } =
            self.scenario;

        let switch = Switch::new(agent, switch_config).map_err(|e| format!("switch config: {e}"))?;
        let controller = Controller::new(RecordingApplication::default(), controller_config)
            .map_err(|e| format!("controller config: {e}"))?;

        let link = Link::with_peers(SimEnv::with_seed(seed), switch, controller);
        let mut world = World::new(link);
        let link = world.link_mut();

        link.start().map_err(|e| format!("handshake failed: {e}"))?;
        link.set_faults(faults);

        for body in requests {
            link.controller_mut().application_mut().queue(body);
        }
        link.pump().map_err(|e| format!("requests failed: {e}"))?;

        if let Some(advance) = time_advance {
            let step = step.unwrap_or(advance);
            link.run_for(advance, step).map_err(|e| format!("time advance failed: {e}"))?;
        }

        (self.oracle)(&world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_requires_oracle() {
        let _scenario = Scenario::new().oracle(Box::new(|_world| Ok(())));
    }

    #[test]
    fn scenario_establishes_both_ends() {
        Scenario::new()
            .oracle(Box::new(|world| {
                if world.all_established() { Ok(()) } else { Err("not established".into()) }
            }))
            .run()
            .expect("scenario should succeed");
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = ConnectionConfig { feature_wait: Duration::ZERO, ..Default::default() };
        let err = Scenario::new().with_switch_config(config).oracle(Box::new(|_| Ok(()))).run().unwrap_err();
        assert!(err.starts_with("switch config"));
    }
}
