//! Error types for the ofp wire layer.
//!
//! Every codec function reports one of three condition families, each naming
//! the structure it was working on when the check failed:
//!
//! - `Available`: fewer bytes remained than the structure needs
//! - `Bad`: a value is present but not acceptable (unknown enumerant, out of
//!   range field, malformed composite)
//! - `Excess`: a declared length disagreed with what the contents consumed,
//!   or a sequence did not fit the destination budget
//!
//! Decoding is all-or-nothing. The first condition hit at any nesting depth is
//! returned unchanged to the caller.

use std::fmt;

use thiserror::Error;

/// The structure a [`ProtocolError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    /// Fixed 8-byte message header
    MessageHeader,
    /// Protocol version byte
    Version,
    /// Message body
    Message,
    /// Action type/length header
    ActionHeader,
    /// Action body
    Action,
    /// Instruction type/length header
    InstructionHeader,
    /// Instruction body
    Instruction,
    /// Queue property header
    PropertyHeader,
    /// Queue property body
    QueueProperty,
    /// Queue description with its property list
    PacketQueue,
    /// OXM match block
    Match,
    /// Single OXM TLV
    OxmField,
    /// Group bucket
    Bucket,
    /// Port description
    Port,
    /// Statistics type/flags sub-header
    StatsHeader,
    /// Statistics body
    StatsBody,
    /// Switch description strings
    Desc,
    /// Per-flow statistics entry
    FlowStats,
    /// Per-table statistics entry
    TableStats,
    /// Per-port statistics entry
    PortStats,
    /// Aggregate flow statistics
    Aggregate,
    /// Error message body
    ErrorMsg,
    /// Switch features
    Features,
    /// Switch configuration
    SwitchConfig,
    /// Packet-in body
    PacketIn,
    /// Flow-removed body
    FlowRemoved,
    /// Port-status body
    PortStatus,
    /// Packet-out body
    PacketOut,
    /// Flow-mod body
    FlowMod,
    /// Group-mod body
    GroupMod,
    /// Port-mod body
    PortMod,
    /// Table-mod body
    TableMod,
    /// Queue configuration request/reply
    QueueConfig,
    /// Role request/reply
    Role,
    /// Repeated elements
    Sequence,
}

impl Item {
    /// Lower-case name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MessageHeader => "message header",
            Self::Version => "version",
            Self::Message => "message",
            Self::ActionHeader => "action header",
            Self::Action => "action",
            Self::InstructionHeader => "instruction header",
            Self::Instruction => "instruction",
            Self::PropertyHeader => "queue property header",
            Self::QueueProperty => "queue property",
            Self::PacketQueue => "packet queue",
            Self::Match => "match",
            Self::OxmField => "oxm field",
            Self::Bucket => "bucket",
            Self::Port => "port",
            Self::StatsHeader => "stats header",
            Self::StatsBody => "stats body",
            Self::Desc => "description",
            Self::FlowStats => "flow stats",
            Self::TableStats => "table stats",
            Self::PortStats => "port stats",
            Self::Aggregate => "aggregate stats",
            Self::ErrorMsg => "error",
            Self::Features => "features",
            Self::SwitchConfig => "switch config",
            Self::PacketIn => "packet-in",
            Self::FlowRemoved => "flow-removed",
            Self::PortStatus => "port-status",
            Self::PacketOut => "packet-out",
            Self::FlowMod => "flow-mod",
            Self::GroupMod => "group-mod",
            Self::PortMod => "port-mod",
            Self::TableMod => "table-mod",
            Self::QueueConfig => "queue config",
            Self::Role => "role",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Protocol-level errors raised while decoding, encoding or validating.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolError {
    /// Not enough bytes remained for the structure
    #[error("not enough bytes for {0}")]
    Available(Item),

    /// Structure decoded but holds an unacceptable value
    #[error("invalid {0}")]
    Bad(Item),

    /// Declared length did not match the consumed contents
    #[error("length mismatch in {0}")]
    Excess(Item),
}

impl ProtocolError {
    /// The structure this error refers to
    #[must_use]
    pub const fn item(&self) -> Item {
        match self {
            Self::Available(item) | Self::Bad(item) | Self::Excess(item) => *item,
        }
    }

    /// True for the `Available` family
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// True for the `Bad` family
    #[must_use]
    pub const fn is_bad(&self) -> bool {
        matches!(self, Self::Bad(_))
    }

    /// True for the `Excess` family
    #[must_use]
    pub const fn is_excess(&self) -> bool {
        matches!(self, Self::Excess(_))
    }
}

/// Convenient Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
