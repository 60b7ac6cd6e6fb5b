//! Deterministic harness for the ofp connection state machines.
//!
//! Two ways to run a [`Switch`](ofp_core::Switch) or
//! [`Controller`](ofp_core::Controller):
//!
//! - [`Link`] and [`scenario`]: both ends in one process, joined by an
//!   in-memory byte pipe with a virtual clock and seeded fault injection.
//!   Every run is reproducible from its seed.
//! - [`driver`]: one end over any tokio `AsyncRead + AsyncWrite` stream.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod error;
pub mod link;
pub mod recording;
pub mod scenario;
pub mod sim_env;

pub use driver::DriverConfig;
pub use error::HarnessError;
pub use link::{Counters, End, Faults, Link};
pub use recording::{Event, RecordingAgent, RecordingApplication};
pub use sim_env::SimEnv;
