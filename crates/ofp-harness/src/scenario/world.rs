//! World state for scenario execution.
//!
//! The World owns one switch-controller [`Link`] and exposes read access for
//! oracles, plus a few predicates over both ends.

use ofp_core::{Controller, Peer, State, Switch};

use crate::{
    link::{Counters, End, Link},
    recording::{RecordingAgent, RecordingApplication},
};

/// Snapshot handed to oracles
#[derive(Debug)]
pub struct World {
    link: Link,
}

impl World {
    pub(crate) fn new(link: Link) -> Self {
        Self { link }
    }

    pub(crate) fn link_mut(&mut self) -> &mut Link {
        &mut self.link
    }

    /// Underlying link
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Switch end
    pub fn switch(&self) -> &Switch<RecordingAgent> {
        self.link.switch()
    }

    /// Controller end
    pub fn controller(&self) -> &Controller<RecordingApplication> {
        self.link.controller()
    }

    /// Recorded switch-side callbacks
    pub fn agent(&self) -> &RecordingAgent {
        self.switch().agent()
    }

    /// Recorded controller-side callbacks
    pub fn application(&self) -> &RecordingApplication {
        self.controller().application()
    }

    /// Switch message counters
    pub fn switch_counters(&self) -> Counters {
        self.link.counters(End::Switch)
    }

    /// Controller message counters
    pub fn controller_counters(&self) -> Counters {
        self.link.counters(End::Controller)
    }

    /// True if both ends are established
    pub fn all_established(&self) -> bool {
        self.switch().state() == State::Established && self.controller().state() == State::Established
    }

    /// True if the controller holds exactly the features the switch reports
    pub fn features_match(&self) -> bool {
        self.controller().features() == Some(&self.agent().features)
    }

    /// True if neither end recorded a failure
    pub fn no_failures(&self) -> bool {
        self.switch().failure().is_none() && self.controller().failure().is_none()
    }
}
