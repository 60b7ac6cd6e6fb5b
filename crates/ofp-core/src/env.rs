//! Environment abstraction for deterministic testing.
//!
//! The state machines never read the clock or draw randomness themselves;
//! callers pass `now` into every transition. Code that surrounds them (the
//! harness, a driver, an agent choosing a datapath id) gets time and
//! randomness from an [`Environment`] so a simulation can replace both.
//!
//! # Invariants
//!
//! - Monotonicity: `now()` never goes backwards
//! - Determinism: a simulated environment built from the same seed yields
//!   the same random sequence

use std::{future::Future, time::Duration, time::Instant};

/// Source of time and randomness.
///
/// Implemented by the harness's `SimEnv` with a virtual clock and a seeded
/// RNG. A production implementation would use the system clock and OS
/// entropy.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current time. Never decreases.
    fn now(&self) -> Instant;

    /// Wait for `duration`.
    ///
    /// A simulated clock advances instantly. Only drivers call this; state
    /// machines are ticked with an explicit `now` instead.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Random `u64`, e.g. a datapath id or a master election generation
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Random `u32`
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }
}
