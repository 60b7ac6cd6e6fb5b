//! Message bodies and the [`Message`] element.
//!
//! A message is an 8-byte [`MessageHeader`] followed by the body its type
//! byte selects. The body family is [`Body`]; the generic element codec
//! does the framing, so decoding a message is exactly the element procedure
//! with `Bad(version)` checked before the type.
//!
//! Requests that carry nothing (features, get-config, barrier) are unit
//! variants and encode as a bare header.

pub mod flow;
pub mod group;
pub mod port;
pub mod queue;
pub mod session;
pub mod stats;

use std::fmt;

use bytes::Bytes;

use crate::{
    Item, MessageHeader, MessageType,
    element::Element,
    errors::Result,
    variant::payload_enum,
};

pub use flow::{FlowMod, FlowModCommand, FlowRemoved, FlowRemovedReason, PacketIn, PacketInReason, PacketOut, TableMod};
pub use group::{Bucket, GroupMod, GroupModCommand, GroupType};
pub use port::{Port, PortMod, PortReason, PortStatus};
pub use queue::{PacketQueue, QueueGetConfigReply, QueueGetConfigRequest, QueueProp, QueuePropBody, Rate};
pub use session::{Echo, ErrorMsg, ErrorType, ExperimenterMsg, FeaturesReply, Hello, Role, RoleMsg, SwitchConfig};
pub use stats::{
    AggregateStats, Desc, FlowStats, FlowStatsRequest, PortStats, PortStatsRequest, Stats, StatsReply, StatsReplyBody,
    StatsRequest, StatsRequestBody, StatsType, TableStats,
};

payload_enum! {
    /// Message bodies keyed by [`MessageType`]
    pub enum Body: MessageType, Item::Message {
        /// Version negotiation
        Hello(Hello),
        /// Error report
        Error(ErrorMsg),
        /// Keepalive request
        EchoRequest(Echo),
        /// Keepalive reply
        EchoReply(Echo),
        /// Vendor message
        Experimenter(ExperimenterMsg),
        /// Switch features
        FeaturesReply(FeaturesReply),
        /// Current switch config
        GetConfigReply(SwitchConfig),
        /// New switch config
        SetConfig(SwitchConfig),
        /// Packet sent to the controller
        PacketIn(PacketIn),
        /// Flow entry removed
        FlowRemoved(FlowRemoved),
        /// Port changed
        PortStatus(PortStatus),
        /// Packet injected by the controller
        PacketOut(PacketOut),
        /// Flow table modification
        FlowMod(FlowMod),
        /// Group table modification
        GroupMod(GroupMod),
        /// Port modification
        PortMod(PortMod),
        /// Table configuration
        TableMod(TableMod),
        /// Statistics request
        StatsRequest(StatsRequest),
        /// Statistics reply
        StatsReply(StatsReply),
        /// Queue configuration request
        QueueGetConfigRequest(QueueGetConfigRequest),
        /// Queue configuration reply
        QueueGetConfigReply(QueueGetConfigReply),
        /// Role request
        RoleRequest(RoleMsg),
        /// Role reply
        RoleReply(RoleMsg),
    }
    empty(0) {
        /// Ask for switch features
        FeaturesRequest,
        /// Ask for switch config
        GetConfigRequest,
        /// Barrier request
        BarrierRequest,
        /// Barrier reply
        BarrierReply,
    }
}

/// A complete protocol message
pub type Message = Element<MessageHeader, Body>;

impl Message {
    /// Message carrying `body` under transaction id `xid`
    #[must_use]
    pub fn with_xid(xid: u32, body: Body) -> Self {
        Self::with_header(MessageHeader::new(xid), body)
    }

    /// Reply to `self`: same transaction id, new body
    #[must_use]
    pub fn reply(&self, body: Body) -> Self {
        Self::with_xid(self.xid(), body)
    }

    /// Transaction id
    #[must_use]
    pub fn xid(&self) -> u32 {
        self.header().xid()
    }

    /// Replace the transaction id
    pub fn set_xid(&mut self, xid: u32) {
        self.header_mut().set_xid(xid);
    }

    /// Type of the body
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.tag()
    }

    /// Borrow the body
    #[must_use]
    pub const fn body(&self) -> &Body {
        self.payload()
    }

    /// Take the body
    #[must_use]
    pub fn into_body(self) -> Body {
        self.into_payload()
    }

    /// Encode to a standalone byte block
    ///
    /// # Errors
    ///
    /// `Excess(_)` if the message or a nested length field overflows.
    pub fn to_bytes(&self) -> Result<Bytes> {
        crate::to_bytes(self)
    }

    /// Decode exactly one message
    ///
    /// # Errors
    ///
    /// Any decode condition, or `Excess(message header)` on trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crate::from_bytes(bytes)
    }

    /// Declared total length of the message at the front of `bytes`, if its
    /// header is complete
    #[must_use]
    pub fn peek_length(bytes: &[u8]) -> Option<usize> {
        MessageHeader::parse(bytes).ok().map(|header| usize::from(header.length()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::codec::Wire;
        write!(f, "{} (xid={}, {} bytes)", self.message_type(), self.xid(), self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProtocolError, codec::Wire};

    #[test]
    fn barrier_is_a_bare_header() {
        let msg = Message::with_xid(7, Body::BarrierRequest);
        assert_eq!(hex::encode(msg.to_bytes().unwrap()), "0414000800000007");
        assert_eq!(Message::from_bytes(&msg.to_bytes().unwrap()).unwrap(), msg);
    }

    #[test]
    fn echo_round_trip_keeps_xid() {
        let msg = Message::with_xid(0xdead_beef, Body::EchoRequest(Echo { data: Bytes::from_static(b"ping") }));
        let bytes = msg.to_bytes().unwrap();
        assert_eq!(Message::peek_length(&bytes), Some(12));
        let decoded = Message::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.xid(), 0xdead_beef);
        assert_eq!(decoded.message_type(), MessageType::EchoRequest);

        let reply = decoded.reply(Body::EchoReply(Echo { data: Bytes::from_static(b"ping") }));
        assert_eq!(reply.xid(), 0xdead_beef);
    }

    #[test]
    fn set_xid_survives_encode() {
        let mut msg = Message::new(Body::FeaturesRequest);
        msg.set_xid(42);
        let decoded = Message::from_bytes(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.xid(), 42);
    }

    #[test]
    fn wrong_version_is_bad_version() {
        let mut bytes = Message::with_xid(1, Body::Hello(Hello::default())).to_bytes().unwrap().to_vec();
        bytes[0] = 0x01;
        assert_eq!(Message::from_bytes(&bytes), Err(ProtocolError::Bad(Item::Version)));
    }

    #[test]
    fn unknown_type_is_bad_header() {
        let bytes = [0x04, 0x63, 0x00, 0x08, 0, 0, 0, 1];
        assert_eq!(Message::from_bytes(&bytes), Err(ProtocolError::Bad(Item::MessageHeader)));
    }

    #[test]
    fn body_too_short_for_its_type() {
        // a role request with only 4 of its 16 body bytes
        let bytes = [0x04, 0x18, 0x00, 0x0c, 0, 0, 0, 1, 0, 0, 0, 2];
        assert_eq!(Message::from_bytes(&bytes), Err(ProtocolError::Available(Item::Role)));
    }

    #[test]
    fn display() {
        let msg = Message::with_xid(3, Body::EchoReply(Echo::default()));
        assert_eq!(msg.to_string(), "echo-reply (xid=3, 8 bytes)");
        assert_eq!(msg.bytes(), 8);
    }

    #[test]
    fn peek_needs_a_full_header() {
        assert_eq!(Message::peek_length(&[4, 0, 0]), None);
    }
}
