//! Scenario testing framework for deterministic simulation tests.
//!
//! This module provides a declarative API for writing scenario-based tests
//! that follow the Oracle Pattern. Scenarios run a switch and a controller
//! over an in-memory link and end with a mandatory oracle check.

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use oracle::OracleFn;
pub use world::World;
