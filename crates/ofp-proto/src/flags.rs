//! Bit sets carried in message bodies.
//!
//! Flag words are parsed with `from_bits_retain`, so decoding never fails on
//! unknown bits. Whether unknown bits are acceptable is decided by the
//! owning message's `validate`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Switch capabilities advertised in a features reply
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Capabilities: u32 {
        /// Flow statistics
        const FLOW_STATS = 1 << 0;
        /// Table statistics
        const TABLE_STATS = 1 << 1;
        /// Port statistics
        const PORT_STATS = 1 << 2;
        /// Group statistics
        const GROUP_STATS = 1 << 3;
        /// Can reassemble IP fragments
        const IP_REASM = 1 << 5;
        /// Queue statistics
        const QUEUE_STATS = 1 << 6;
        /// Switch will block looping ports
        const PORT_BLOCKED = 1 << 8;
    }
}

bitflags! {
    /// IP fragment handling in the switch configuration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ConfigFlags: u16 {
        /// Drop fragments
        const FRAG_DROP = 1 << 0;
        /// Reassemble fragments
        const FRAG_REASM = 1 << 1;
    }
}

impl ConfigFlags {
    /// True if the flags name a single fragment mode
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.bits() <= Self::FRAG_REASM.bits()
    }
}

bitflags! {
    /// Administrative port settings
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PortConfig: u32 {
        /// Port is administratively down
        const PORT_DOWN = 1 << 0;
        /// Drop received packets
        const NO_RECV = 1 << 2;
        /// Drop packets forwarded to the port
        const NO_FWD = 1 << 5;
        /// Do not send packet-in messages for the port
        const NO_PACKET_IN = 1 << 6;
    }
}

bitflags! {
    /// Current port state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PortState: u32 {
        /// No physical link
        const LINK_DOWN = 1 << 0;
        /// Blocked for flooding
        const BLOCKED = 1 << 1;
        /// Live for fast failover groups
        const LIVE = 1 << 2;
    }
}

bitflags! {
    /// Port speeds and media
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PortFeatures: u32 {
        /// 10 Mb half-duplex
        const RATE_10MB_HD = 1 << 0;
        /// 10 Mb full-duplex
        const RATE_10MB_FD = 1 << 1;
        /// 100 Mb half-duplex
        const RATE_100MB_HD = 1 << 2;
        /// 100 Mb full-duplex
        const RATE_100MB_FD = 1 << 3;
        /// 1 Gb half-duplex
        const RATE_1GB_HD = 1 << 4;
        /// 1 Gb full-duplex
        const RATE_1GB_FD = 1 << 5;
        /// 10 Gb full-duplex
        const RATE_10GB_FD = 1 << 6;
        /// 40 Gb full-duplex
        const RATE_40GB_FD = 1 << 7;
        /// 100 Gb full-duplex
        const RATE_100GB_FD = 1 << 8;
        /// 1 Tb full-duplex
        const RATE_1TB_FD = 1 << 9;
        /// Other rate
        const OTHER = 1 << 10;
        /// Copper medium
        const COPPER = 1 << 11;
        /// Fiber medium
        const FIBER = 1 << 12;
        /// Auto-negotiation
        const AUTONEG = 1 << 13;
        /// Pause
        const PAUSE = 1 << 14;
        /// Asymmetric pause
        const PAUSE_ASYM = 1 << 15;
    }
}

bitflags! {
    /// Flow-mod and flow-stats flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FlowModFlags: u16 {
        /// Send flow-removed when the flow expires or is deleted
        const SEND_FLOW_REM = 1 << 0;
        /// Check for overlapping entries first
        const CHECK_OVERLAP = 1 << 1;
        /// Reset packet and byte counts
        const RESET_COUNTS = 1 << 2;
        /// Do not keep packet count
        const NO_PKT_COUNTS = 1 << 3;
        /// Do not keep byte count
        const NO_BYT_COUNTS = 1 << 4;
    }
}

bitflags! {
    /// Statistics request and reply flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StatsFlags: u16 {
        /// More replies follow
        const MORE = 1 << 0;
    }
}

macro_rules! empty_default {
    ($($name:ident),* $(,)?) => {
        $(
            impl Default for $name {
                fn default() -> Self {
                    Self::empty()
                }
            }
        )*
    };
}

empty_default!(Capabilities, ConfigFlags, PortConfig, PortState, PortFeatures, FlowModFlags, StatsFlags);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_retained() {
        let flags = FlowModFlags::from_bits_retain(0x8001);
        assert!(flags.contains(FlowModFlags::SEND_FLOW_REM));
        assert_eq!(flags.bits(), 0x8001);
        assert_ne!(flags.bits() & !FlowModFlags::all().bits(), 0);
    }

    #[test]
    fn config_flags_allow_one_mode() {
        assert!(ConfigFlags::empty().is_valid());
        assert!(ConfigFlags::FRAG_DROP.is_valid());
        assert!(ConfigFlags::FRAG_REASM.is_valid());
        assert!(!(ConfigFlags::FRAG_DROP | ConfigFlags::FRAG_REASM).is_valid());
        assert!(!ConfigFlags::from_bits_retain(0x10).is_valid());
    }

    #[test]
    fn capabilities_layout() {
        let caps = Capabilities::FLOW_STATS | Capabilities::PORT_BLOCKED;
        assert_eq!(caps.bits(), 0x101);
    }
}
