//! Message types and reserved protocol numbers.

use std::fmt;

use crate::variant::wire_enum;

wire_enum! {
    /// Message type carried in the header's type byte.
    ///
    /// Multipart messages are called "stats" here, after the name they had
    /// before 1.3.
    pub enum MessageType: u8 {
        /// Version negotiation
        Hello = 0,
        /// Error report
        Error = 1,
        /// Keepalive request
        EchoRequest = 2,
        /// Keepalive reply
        EchoReply = 3,
        /// Vendor extension
        Experimenter = 4,
        /// Controller asks for switch features
        FeaturesRequest = 5,
        /// Switch features
        FeaturesReply = 6,
        /// Controller asks for switch config
        GetConfigRequest = 7,
        /// Switch config
        GetConfigReply = 8,
        /// Controller sets switch config
        SetConfig = 9,
        /// Packet sent to the controller
        PacketIn = 10,
        /// Flow entry removed
        FlowRemoved = 11,
        /// Port added, removed or changed
        PortStatus = 12,
        /// Controller sends a packet out
        PacketOut = 13,
        /// Flow table modification
        FlowMod = 14,
        /// Group table modification
        GroupMod = 15,
        /// Port behaviour modification
        PortMod = 16,
        /// Table configuration
        TableMod = 17,
        /// Statistics (multipart) request
        StatsRequest = 18,
        /// Statistics (multipart) reply
        StatsReply = 19,
        /// Barrier request
        BarrierRequest = 20,
        /// Barrier reply
        BarrierReply = 21,
        /// Queue configuration request
        QueueGetConfigRequest = 22,
        /// Queue configuration reply
        QueueGetConfigReply = 23,
        /// Controller role request
        RoleRequest = 24,
        /// Controller role reply
        RoleReply = 25,
    }
}

impl MessageType {
    /// Reply kind a peer must answer this request with, if any
    #[must_use]
    pub const fn expected_reply(self) -> Option<Self> {
        match self {
            Self::EchoRequest => Some(Self::EchoReply),
            Self::FeaturesRequest => Some(Self::FeaturesReply),
            Self::GetConfigRequest => Some(Self::GetConfigReply),
            Self::StatsRequest => Some(Self::StatsReply),
            Self::BarrierRequest => Some(Self::BarrierReply),
            Self::QueueGetConfigRequest => Some(Self::QueueGetConfigReply),
            Self::RoleRequest => Some(Self::RoleReply),
            _ => None,
        }
    }

    /// True for kinds a switch refuses from a slave controller
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::SetConfig
                | Self::PacketOut
                | Self::FlowMod
                | Self::GroupMod
                | Self::PortMod
                | Self::TableMod
        )
    }

    /// Lower-case name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::Error => "error",
            Self::EchoRequest => "echo-request",
            Self::EchoReply => "echo-reply",
            Self::Experimenter => "experimenter",
            Self::FeaturesRequest => "features-request",
            Self::FeaturesReply => "features-reply",
            Self::GetConfigRequest => "get-config-request",
            Self::GetConfigReply => "get-config-reply",
            Self::SetConfig => "set-config",
            Self::PacketIn => "packet-in",
            Self::FlowRemoved => "flow-removed",
            Self::PortStatus => "port-status",
            Self::PacketOut => "packet-out",
            Self::FlowMod => "flow-mod",
            Self::GroupMod => "group-mod",
            Self::PortMod => "port-mod",
            Self::TableMod => "table-mod",
            Self::StatsRequest => "stats-request",
            Self::StatsReply => "stats-reply",
            Self::BarrierRequest => "barrier-request",
            Self::BarrierReply => "barrier-reply",
            Self::QueueGetConfigRequest => "queue-get-config-request",
            Self::QueueGetConfigReply => "queue-get-config-reply",
            Self::RoleRequest => "role-request",
            Self::RoleReply => "role-reply",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buffer id meaning "packet data is carried inline"
pub const NO_BUFFER: u32 = 0xffff_ffff;

/// Reserved and limit port numbers
pub mod port_no {
    /// Highest physical port number
    pub const MAX: u32 = 0xffff_ff00;
    /// Send back out the ingress port
    pub const IN_PORT: u32 = 0xffff_fff8;
    /// Submit to the first flow table
    pub const TABLE: u32 = 0xffff_fff9;
    /// Traditional L2/L3 processing
    pub const NORMAL: u32 = 0xffff_fffa;
    /// Flood along the spanning tree
    pub const FLOOD: u32 = 0xffff_fffb;
    /// All ports except ingress
    pub const ALL: u32 = 0xffff_fffc;
    /// Send to the controller
    pub const CONTROLLER: u32 = 0xffff_fffd;
    /// Local networking stack
    pub const LOCAL: u32 = 0xffff_fffe;
    /// Wildcard, not a valid output
    pub const ANY: u32 = 0xffff_ffff;

    /// True for a port a packet can be sent to
    #[must_use]
    pub const fn is_output(port: u32) -> bool {
        (port != 0 && port <= MAX) || (port >= IN_PORT && port <= LOCAL)
    }
}

/// Reserved group numbers
pub mod group_id {
    /// Highest regular group number
    pub const MAX: u32 = 0xffff_ff00;
    /// All groups, only valid for deletes
    pub const ALL: u32 = 0xffff_fffc;
    /// Wildcard
    pub const ANY: u32 = 0xffff_ffff;
}

/// Reserved table numbers
pub mod table_id {
    /// Highest regular table number
    pub const MAX: u8 = 0xfe;
    /// All tables, only valid for deletes
    pub const ALL: u8 = 0xff;
}
