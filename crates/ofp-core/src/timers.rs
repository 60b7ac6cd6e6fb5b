//! Deadline table for outstanding requests.
//!
//! Each timer waits for one message kind under one transaction id. Timers
//! are ordered by deadline so expiry is "pop everything due", and indexed by
//! `(xid, kind)` so a reply can cancel its timer without a scan.

use std::{
    collections::{BTreeMap, HashMap},
    time::Instant,
};

use ofp_proto::MessageType;

/// One pending deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// Transaction id the awaited message will carry
    pub xid: u32,
    /// Kind of the awaited message
    pub kind: MessageType,
    /// When waiting stops
    pub deadline: Instant,
}

type Key = (Instant, u64);

/// Timer table
///
/// # Invariants
///
/// - At most one timer exists per `(xid, kind)`; re-arming replaces it.
/// - `queue` and `index` always hold the same set of timers.
/// - Timers with equal deadlines expire in the order they were armed.
#[derive(Debug, Default)]
pub struct Timers {
    queue: BTreeMap<Key, Timer>,
    index: HashMap<(u32, MessageType), Key>,
    seq: u64,
}

impl Timers {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `kind` under `xid` until `deadline`
    pub fn arm(&mut self, xid: u32, kind: MessageType, deadline: Instant) {
        self.satisfy(xid, kind);
        let key = (deadline, self.seq);
        self.seq += 1;
        self.queue.insert(key, Timer { xid, kind, deadline });
        self.index.insert((xid, kind), key);
    }

    /// Cancel the timer for `(xid, kind)`. Returns false if there was none.
    pub fn satisfy(&mut self, xid: u32, kind: MessageType) -> bool {
        match self.index.remove(&(xid, kind)) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Cancel every timer under `xid`, whatever it waits for.
    ///
    /// Returns how many were removed. An error reply answers a request
    /// regardless of the reply kind the request expected.
    pub fn satisfy_xid(&mut self, xid: u32) -> usize {
        let keys: Vec<_> = self.index.keys().filter(|(x, _)| *x == xid).copied().collect();
        keys.into_iter().filter(|&(xid, kind)| self.satisfy(xid, kind)).count()
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn expire(&mut self, now: Instant) -> Vec<Timer> {
        let mut expired = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let timer = entry.remove();
            self.index.remove(&(timer.xid, timer.kind));
            expired.push(timer);
        }
        expired
    }

    /// Drop every timer
    pub fn clear(&mut self) {
        self.queue.clear();
        self.index.clear();
    }

    /// Number of pending timers
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Earliest pending deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Deadline of the timer for `(xid, kind)`, if armed
    #[must_use]
    pub fn deadline_of(&self, xid: u32, kind: MessageType) -> Option<Instant> {
        self.index.get(&(xid, kind)).map(|(deadline, _)| *deadline)
    }

    /// Pending timers, earliest first
    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.queue.values()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    fn secs(t0: Instant, s: u64) -> Instant {
        t0 + Duration::from_secs(s)
    }

    #[test]
    fn expire_pops_due_timers_in_order() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.arm(3, MessageType::BarrierReply, secs(t0, 30));
        timers.arm(1, MessageType::EchoReply, secs(t0, 10));
        timers.arm(2, MessageType::StatsReply, secs(t0, 10));

        let expired = timers.expire(secs(t0, 10));
        assert_eq!(expired.iter().map(|t| t.xid).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(secs(t0, 30)));
        assert!(timers.expire(secs(t0, 29)).is_empty());
    }

    #[test]
    fn satisfy_removes_only_the_match() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.arm(5, MessageType::EchoReply, secs(t0, 1));

        assert!(!timers.satisfy(5, MessageType::BarrierReply));
        assert!(!timers.satisfy(6, MessageType::EchoReply));
        assert!(timers.satisfy(5, MessageType::EchoReply));
        assert!(!timers.satisfy(5, MessageType::EchoReply));
        assert!(timers.is_empty());
    }

    #[test]
    fn rearm_replaces() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.arm(5, MessageType::StatsReply, secs(t0, 1));
        timers.arm(5, MessageType::StatsReply, secs(t0, 9));

        assert_eq!(timers.len(), 1);
        assert_eq!(timers.deadline_of(5, MessageType::StatsReply), Some(secs(t0, 9)));
        assert!(timers.expire(secs(t0, 5)).is_empty());
    }

    #[test]
    fn satisfy_xid_clears_all_kinds() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.arm(5, MessageType::StatsReply, secs(t0, 1));
        timers.arm(5, MessageType::BarrierReply, secs(t0, 2));
        timers.arm(6, MessageType::BarrierReply, secs(t0, 3));

        assert_eq!(timers.satisfy_xid(5), 2);
        assert_eq!(timers.iter().map(|t| t.xid).collect::<Vec<_>>(), vec![6]);
    }

    proptest! {
        #[test]
        fn prop_expire_partitions_by_deadline(
            offsets in proptest::collection::vec(0u64..100, 0..32),
            cut in 0u64..100,
        ) {
            let t0 = Instant::now();
            let mut timers = Timers::new();
            for (xid, offset) in offsets.iter().enumerate() {
                timers.arm(xid as u32, MessageType::EchoReply, secs(t0, *offset));
            }

            let now = secs(t0, cut);
            let expired = timers.expire(now);

            prop_assert!(expired.iter().all(|t| t.deadline <= now));
            prop_assert!(timers.iter().all(|t| t.deadline > now));
            prop_assert!(expired.windows(2).all(|w| w[0].deadline <= w[1].deadline));
            prop_assert_eq!(expired.len() + timers.len(), offsets.len());
            for timer in &expired {
                prop_assert_eq!(timers.deadline_of(timer.xid, timer.kind), None);
            }
        }
    }
}
