//! Oracle functions for scenario verification.
//!
//! Oracle functions run at the end of scenarios to verify global consistency.
//! They receive the final world and assert invariants.

use ofp_core::Peer;

use crate::scenario::World;

/// Oracle function type.
///
/// Receives immutable reference to world state and returns:
/// - `Ok(())` if all invariants hold
/// - `Err(message)` if verification fails
pub type OracleFn = Box<dyn FnOnce(&World) -> Result<(), String>>;

/// Both ends are established
pub fn all_established() -> OracleFn {
    Box::new(|world| {
        if world.all_established() {
            Ok(())
        } else {
            Err(format!(
                "expected both established, switch is {} and controller is {}",
                world.switch().state(),
                world.controller().state(),
            ))
        }
    })
}

/// The controller learned the switch's features
pub fn features_match() -> OracleFn {
    Box::new(|world| {
        if world.features_match() {
            Ok(())
        } else {
            Err(format!(
                "controller holds {:?}, switch reports {:?}",
                world.controller().features(),
                world.agent().features
            ))
        }
    })
}

/// Neither end failed
pub fn no_failures() -> OracleFn {
    Box::new(|world| {
        if world.no_failures() {
            Ok(())
        } else {
            Err(format!(
                "switch failure {:?}, controller failure {:?}",
                world.switch().failure(),
                world.controller().failure(),
            ))
        }
    })
}

/// Combine multiple oracles into one.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| {
        for oracle in oracles {
            oracle(world)?;
        }
        Ok(())
    })
}
