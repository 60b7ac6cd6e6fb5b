//! Transaction id allocation.
//!
//! Xids only need to be distinct among a connection's outstanding requests,
//! so a wrapping counter is enough. Zero is skipped: the switch uses it for
//! its feature-wait timer, which no request ever answers.

use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe xid counter
#[derive(Debug)]
pub struct XidGenerator {
    next: AtomicU32,
}

impl XidGenerator {
    /// Counter whose first id is `start` (or 1 if `start` is 0)
    #[must_use]
    pub const fn starting_at(start: u32) -> Self {
        Self { next: AtomicU32::new(start) }
    }

    /// Allocate an id. Never returns 0.
    pub fn next(&self) -> u32 {
        loop {
            let xid = self.next.fetch_add(1, Ordering::Relaxed);
            if xid != 0 {
                return xid;
            }
        }
    }
}

impl Default for XidGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

static GLOBAL: XidGenerator = XidGenerator::starting_at(1);

/// Allocate from the process-wide generator
pub fn next() -> u32 {
    GLOBAL.next()
}
