//! Fixed 8-byte message header with zero-copy parsing.
//!
//! ```text
//! ┌─────────┬──────┬──────────────┬──────────────────────┐
//! │ version │ type │ length (u16) │      xid (u32)       │
//! └─────────┴──────┴──────────────┴──────────────────────┘
//! ```
//!
//! `length` covers the header itself. Multi-byte fields are stored as raw
//! big-endian byte arrays so any 8 bytes are a valid header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{
    Item, MessageType,
    buffer::{View, ViewMut},
    element::ElementHeader,
    errors::{ProtocolError, Result},
};

/// Message header (network byte order)
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct MessageHeader {
    version: u8,
    msg_type: u8,
    length: [u8; 2],
    xid: [u8; 4],
}

impl MessageHeader {
    /// Size of the serialized header
    pub const SIZE: usize = 8;

    /// Protocol version spoken by this crate (OpenFlow 1.3)
    pub const VERSION: u8 = 0x04;

    /// Header for an empty message with transaction id `xid`
    #[must_use]
    pub fn new(xid: u32) -> Self {
        Self {
            version: Self::VERSION,
            msg_type: 0,
            length: (Self::SIZE as u16).to_be_bytes(),
            xid: xid.to_be_bytes(),
        }
    }

    /// Parse a header from the front of `bytes` without validating it
    ///
    /// # Errors
    ///
    /// `Available(MessageHeader)` if fewer than 8 bytes are given.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::read_from_prefix(bytes)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::Available(Item::MessageHeader))
    }

    /// Serialize to bytes
    #[must_use]
    #[allow(clippy::wrong_self_convention)]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        zerocopy::transmute!(*self)
    }

    /// Protocol version byte
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Raw message type byte
    #[must_use]
    pub fn raw_type(&self) -> u8 {
        self.msg_type
    }

    /// Message type, if known
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        use crate::variant::Tag;
        MessageType::from_raw(self.msg_type)
    }

    /// Declared total length
    #[must_use]
    pub fn length(&self) -> u16 {
        u16::from_be_bytes(self.length)
    }

    /// Transaction id
    #[must_use]
    pub fn xid(&self) -> u32 {
        u32::from_be_bytes(self.xid)
    }

    /// Replace the transaction id
    pub fn set_xid(&mut self, xid: u32) {
        self.xid = xid.to_be_bytes();
    }
}

impl Default for MessageHeader {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ElementHeader for MessageHeader {
    type Tag = MessageType;

    const SIZE: usize = 8;
    const ITEM: Item = Item::MessageHeader;

    fn read(view: &mut View<'_>) -> Self {
        let raw: [u8; 8] = view.get();
        zerocopy::transmute!(raw)
    }

    fn write(&self, view: &mut ViewMut<'_>) {
        view.put_bytes(self.as_bytes());
    }

    fn raw_tag(&self) -> u8 {
        self.msg_type
    }

    fn length(&self) -> usize {
        usize::from(MessageHeader::length(self))
    }

    fn stamp(&mut self, tag: MessageType, length: usize) {
        use crate::variant::Tag;
        self.msg_type = tag.to_raw();
        self.length = u16::try_from(length).unwrap_or(u16::MAX).to_be_bytes();
    }

    fn check(&self) -> Result<()> {
        if self.version == Self::VERSION {
            Ok(())
        } else {
            Err(ProtocolError::Bad(Item::Version))
        }
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for MessageHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHeader")
            .field("version", &format_args!("{:#04x}", self.version()))
            .field("type", &self.raw_type())
            .field("length", &MessageHeader::length(self))
            .field("xid", &self.xid())
            .finish()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for MessageHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for MessageHeader {}
