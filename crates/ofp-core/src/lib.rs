//! Connection state machines for the ofp protocol
//!
//! This crate holds the per-connection logic for both ends of a switch
//! control channel. It performs no I/O: a driver hands it decoded messages
//! (or raw message blocks) and clock ticks, and it answers with an
//! [`Outcome`] listing what to send and whether to keep going.
//!
//! # Architecture
//!
//! ```text
//!      ┌──────────────────────────────┐
//!      │ ofp-core                     │
//!      │ - Switch / Controller FSMs   │
//!      │ - Timers, xids, roles        │
//!      │ - Agent / Application traits │
//!      └──────────────────────────────┘
//!         ↓                       ↓
//! ┌────────────────┐  ┌───────────────────┐
//! │ ofp-harness    │  │ ofp-harness       │
//! │ (Link)         │  │ (driver)          │
//! │ - Virtual time │  │ - tokio streams   │
//! │ - Seeded RNG   │  │ - Interval ticks  │
//! │ - Fault inject │  │                   │
//! └────────────────┘  └───────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - No I/O in core: never spawn tasks, read the clock or draw entropy
//! - Time is a parameter: every transition takes `now`
//! - Deterministic: the same inputs in the same order give the same outputs
//!
//! # Modules
//!
//! - [`connection`]: shared lifecycle, [`State`], [`Outcome`] and [`Peer`]
//! - [`switch`]: switch-side FSM driving an [`Agent`]
//! - [`controller`]: controller-side FSM driving an [`Application`]
//! - [`timers`]: deadline table keyed by transaction id and reply kind
//! - [`xid`]: transaction id allocation
//! - [`config`]: connection timeouts
//! - [`env`]: environment abstraction (time, RNG)
//! - [`error`]: connection error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod agent;
pub mod config;
pub mod connection;
pub mod controller;
pub mod env;
pub mod error;
pub mod switch;
pub mod timers;
pub mod xid;

pub use agent::{Agent, Application, Outbox};
pub use config::ConnectionConfig;
pub use connection::{Outcome, Peer, State};
pub use controller::Controller;
pub use error::ConnectionError;
pub use switch::Switch;
pub use timers::{Timer, Timers};
