//! In-memory control channel between a switch and a controller.
//!
//! Every message crosses the link as encoded bytes and is reassembled with a
//! [`FrameReader`] on the far side, so both state machines exercise the real
//! codec. Faults are applied per message using the environment's RNG, which
//! keeps a faulty run reproducible from its seed.

use std::{collections::VecDeque, time::Duration};

use bytes::{Bytes, BytesMut};
use ofp_core::{Controller, Outcome, Peer, Switch, env::Environment};
use ofp_proto::FrameReader;
use tracing::{debug, trace, warn};

use crate::{
    error::HarnessError,
    recording::{RecordingAgent, RecordingApplication},
    sim_env::SimEnv,
};

/// Bound on deliveries per [`Link::pump`], so two peers that keep answering
/// each other cannot hang a test
const MAX_DELIVERIES: usize = 10_000;

/// Per-message fault probabilities
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Faults {
    /// Message is lost
    pub drop: f64,
    /// One byte of the message is flipped
    pub corrupt: f64,
    /// Message is cut short
    pub truncate: f64,
}

impl Faults {
    /// No faults
    pub const NONE: Self = Self { drop: 0.0, corrupt: 0.0, truncate: 0.0 };

    fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Which end of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    /// The datapath
    Switch,
    /// The controller
    Controller,
}

/// Message counters for one end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Messages handed to the link
    pub sent: usize,
    /// Complete frames taken off the link
    pub received: usize,
    /// Messages the link lost
    pub dropped: usize,
    /// Messages the link damaged
    pub damaged: usize,
    /// Streams that could not be framed
    pub framing_errors: usize,
}

/// A switch and a controller joined by a byte pipe
#[derive(Debug)]
pub struct Link {
    env: SimEnv,
    faults: Faults,
    switch: Switch<RecordingAgent>,
    controller: Controller<RecordingApplication>,
    to_switch: VecDeque<Bytes>,
    to_controller: VecDeque<Bytes>,
    switch_reader: FrameReader,
    controller_reader: FrameReader,
    switch_counters: Counters,
    controller_counters: Counters,
}

impl Link {
    /// Link with default collaborators and configuration
    pub fn new(env: SimEnv) -> Self {
        Self::with_peers(env, Switch::default(), Controller::default())
    }

    /// Link between the given peers
    pub fn with_peers(
        env: SimEnv,
        switch: Switch<RecordingAgent>,
        controller: Controller<RecordingApplication>,
    ) -> Self {
        Self {
            env,
            faults: Faults::NONE,
            switch,
            controller,
            to_switch: VecDeque::new(),
            to_controller: VecDeque::new(),
            switch_reader: FrameReader::new(),
            controller_reader: FrameReader::new(),
            switch_counters: Counters::default(),
            controller_counters: Counters::default(),
        }
    }

    /// Apply `faults` to every message from now on
    pub fn set_faults(&mut self, faults: Faults) {
        self.faults = faults;
    }

    /// Shared environment
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Switch end
    pub fn switch(&self) -> &Switch<RecordingAgent> {
        &self.switch
    }

    /// Switch end, mutably
    pub fn switch_mut(&mut self) -> &mut Switch<RecordingAgent> {
        &mut self.switch
    }

    /// Controller end
    pub fn controller(&self) -> &Controller<RecordingApplication> {
        &self.controller
    }

    /// Controller end, mutably
    pub fn controller_mut(&mut self) -> &mut Controller<RecordingApplication> {
        &mut self.controller
    }

    /// Counters for one end
    pub fn counters(&self, end: End) -> Counters {
        match end {
            End::Switch => self.switch_counters,
            End::Controller => self.controller_counters,
        }
    }

    /// Start both ends and exchange messages until the link is quiet
    pub fn start(&mut self) -> Result<usize, HarnessError> {
        let now = self.env.now();
        let outcome = self.switch.init(now);
        self.send(End::Switch, &outcome)?;
        let outcome = self.controller.init(now);
        self.send(End::Controller, &outcome)?;
        self.pump()
    }

    /// Deliver queued bytes and drain both collaborators until nothing moves.
    /// Returns the number of frames delivered.
    pub fn pump(&mut self) -> Result<usize, HarnessError> {
        let mut delivered = 0;
        while delivered < MAX_DELIVERIES {
            if let Some(bytes) = self.to_switch.pop_front() {
                delivered += self.deliver(End::Switch, &bytes)?;
            } else if let Some(bytes) = self.to_controller.pop_front() {
                delivered += self.deliver(End::Controller, &bytes)?;
            } else if !self.poll()? {
                return Ok(delivered);
            }
        }
        warn!(delivered, "link did not settle");
        Ok(delivered)
    }

    /// Move the clock forward, tick both ends and settle
    pub fn advance(&mut self, duration: Duration) -> Result<usize, HarnessError> {
        self.env.advance(duration);
        let now = self.env.now();
        let outcome = self.switch.time(now);
        self.send(End::Switch, &outcome)?;
        let outcome = self.controller.time(now);
        self.send(End::Controller, &outcome)?;
        self.pump()
    }

    /// Advance `total` in increments of `step`, settling after each. A zero
    /// `step` advances `total` at once.
    pub fn run_for(&mut self, total: Duration, step: Duration) -> Result<usize, HarnessError> {
        let step = if step.is_zero() { total } else { step };
        let mut delivered = 0;
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            let tick = step.min(total - elapsed);
            delivered += self.advance(tick)?;
            elapsed += tick;
        }
        Ok(delivered)
    }

    /// Shut both ends down
    pub fn close(&mut self) {
        let now = self.env.now();
        let _ = self.switch.fini(now);
        let _ = self.controller.fini(now);
        self.to_switch.clear();
        self.to_controller.clear();
        self.switch_reader.clear();
        self.controller_reader.clear();
        debug!("link closed");
    }

    fn poll(&mut self) -> Result<bool, HarnessError> {
        let now = self.env.now();
        let outcome = self.switch.poll(now);
        let switch_sent = self.send(End::Switch, &outcome)?;
        let outcome = self.controller.poll(now);
        let controller_sent = self.send(End::Controller, &outcome)?;
        Ok(switch_sent + controller_sent > 0)
    }

    /// Feed bytes arriving at `end` through its frame reader
    fn deliver(&mut self, end: End, bytes: &[u8]) -> Result<usize, HarnessError> {
        let now = self.env.now();
        let reader = match end {
            End::Switch => &mut self.switch_reader,
            End::Controller => &mut self.controller_reader,
        };
        reader.extend(bytes);

        let mut frames = Vec::new();
        let framing = loop {
            match reader.read_frame() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break None,
                Err(err) => {
                    reader.clear();
                    break Some(err);
                },
            }
        };

        let delivered = frames.len();
        for frame in frames {
            self.counters_mut(end).received += 1;
            let outcome = match end {
                End::Switch => self.switch.recv_bytes(now, &frame),
                End::Controller => self.controller.recv_bytes(now, &frame),
            };
            self.send(end, &outcome)?;
        }

        if let Some(err) = framing {
            warn!(?end, %err, "stream could not be framed");
            self.counters_mut(end).framing_errors += 1;
            // a block too short for a header fails the receiver like a dead stream
            let _ = match end {
                End::Switch => self.switch.recv_bytes(now, &[]),
                End::Controller => self.controller.recv_bytes(now, &[]),
            };
        }
        Ok(delivered)
    }

    /// Queue the messages `from` produced for the opposite end
    fn send(&mut self, from: End, outcome: &Outcome) -> Result<usize, HarnessError> {
        let encoded = outcome.encode()?;
        let count = encoded.len();
        for bytes in encoded {
            self.counters_mut(from).sent += 1;
            let Some(bytes) = self.disturb(from, bytes) else {
                continue;
            };
            trace!(?from, len = bytes.len(), "message on the wire");
            match from {
                End::Switch => self.to_controller.push_back(bytes),
                End::Controller => self.to_switch.push_back(bytes),
            }
        }
        Ok(count)
    }

    fn disturb(&mut self, from: End, bytes: Bytes) -> Option<Bytes> {
        if self.faults.is_none() || bytes.is_empty() {
            return Some(bytes);
        }
        if self.env.chance(self.faults.drop) {
            debug!(?from, "dropping message");
            self.counters_mut(from).dropped += 1;
            return None;
        }
        if self.env.chance(self.faults.corrupt) {
            let mut damaged = BytesMut::from(&bytes[..]);
            let at = self.env.pick(damaged.len());
            damaged[at] ^= 0xff;
            debug!(?from, at, "corrupting message");
            self.counters_mut(from).damaged += 1;
            return Some(damaged.freeze());
        }
        if self.env.chance(self.faults.truncate) {
            let keep = self.env.pick(bytes.len());
            debug!(?from, keep, "truncating message");
            self.counters_mut(from).damaged += 1;
            return Some(bytes.slice(..keep));
        }
        Some(bytes)
    }

    fn counters_mut(&mut self, end: End) -> &mut Counters {
        match end {
            End::Switch => &mut self.switch_counters,
            End::Controller => &mut self.controller_counters,
        }
    }
}
