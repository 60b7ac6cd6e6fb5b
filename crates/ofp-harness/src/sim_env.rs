//! Virtual-clock Environment implementation for deterministic testing.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use ofp_core::env::Environment;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Simulation environment with a virtual clock and a seeded RNG.
///
/// - **Virtual Time**: `now()` is a fixed origin plus an offset that only
///   moves when [`advance`](SimEnv::advance) or `sleep` is called.
/// - **Seeded RNG**: `random_bytes()` draws from a `ChaCha20Rng`, so a run
///   is reproducible from its seed.
///
/// Clones share both the clock and the RNG, so every component of one
/// simulation sees the same time and one random sequence.
#[derive(Clone, Debug)]
pub struct SimEnv {
    origin: Instant,
    state: Arc<Mutex<SimState>>,
}

#[derive(Debug)]
struct SimState {
    elapsed: Duration,
    rng: ChaCha20Rng,
}

impl SimEnv {
    /// Environment seeded with 0
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment seeded with `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(SimState {
                elapsed: Duration::ZERO,
                rng: ChaCha20Rng::seed_from_u64(seed),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // the lock is never held across a panic point
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Move the clock forward
    pub fn advance(&self, duration: Duration) {
        self.lock().elapsed += duration;
    }

    /// Virtual time since the environment was created
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// True with probability `p`
    pub fn chance(&self, p: f64) -> bool {
        p > 0.0 && self.lock().rng.gen_bool(p.min(1.0))
    }

    /// Uniform index below `n`. `n` must be non-zero.
    pub fn pick(&self, n: usize) -> usize {
        self.lock().rng.gen_range(0..n)
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, dest: &mut [u8]) {
        self.lock().rng.fill_bytes(dest);
    }
}
