//! OXM match fields and the match block that carries them.
//!
//! ```text
//! match:  ┌──────────┬────────────┬──────────────────┬─────────────┐
//!         │ type = 1 │ length     │ oxm fields ...   │ pad to 8    │
//!         └──────────┴────────────┴──────────────────┴─────────────┘
//! field:  ┌─────────────┬───────────────────┬────────┬────────────────┐
//!         │ class (u16) │ field(7) | mask(1)│ len u8 │ value [+ mask] │
//!         └─────────────┴───────────────────┴────────┴────────────────┘
//! ```
//!
//! The match length covers its own 4-byte header and the fields but not the
//! trailing padding.

use bytes::Bytes;

use crate::{
    Item,
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    errors::{ProtocolError, Result},
    sequence::Sequence,
};

/// Field class for the standard OpenFlow fields
pub const OPENFLOW_BASIC: u16 = 0x8000;

/// Field numbers within [`OPENFLOW_BASIC`]
pub mod field {
    /// Ingress port
    pub const IN_PORT: u8 = 0;
    /// Ethernet destination
    pub const ETH_DST: u8 = 3;
    /// Ethernet source
    pub const ETH_SRC: u8 = 4;
    /// Ethertype
    pub const ETH_TYPE: u8 = 5;
    /// VLAN id
    pub const VLAN_VID: u8 = 6;
    /// IP protocol
    pub const IP_PROTO: u8 = 10;
    /// IPv4 source
    pub const IPV4_SRC: u8 = 11;
    /// IPv4 destination
    pub const IPV4_DST: u8 = 12;
    /// TCP source port
    pub const TCP_SRC: u8 = 13;
    /// TCP destination port
    pub const TCP_DST: u8 = 14;
}

/// One match field TLV
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OxmField {
    /// Field class
    pub class: u16,
    /// Field number (7 bits)
    pub field: u8,
    /// Value is followed by a mask of the same width
    pub has_mask: bool,
    /// Value, then mask when `has_mask` is set
    pub value: Bytes,
}

impl OxmField {
    /// Exact-match field in the basic class
    #[must_use]
    pub fn basic(field: u8, value: &[u8]) -> Self {
        Self { class: OPENFLOW_BASIC, field, has_mask: false, value: Bytes::copy_from_slice(value) }
    }

    /// Masked field in the basic class
    #[must_use]
    pub fn basic_masked(field: u8, value: &[u8], mask: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(value.len() + mask.len());
        raw.extend_from_slice(value);
        raw.extend_from_slice(mask);
        Self { class: OPENFLOW_BASIC, field, has_mask: true, value: raw.into() }
    }

    /// Ingress port
    #[must_use]
    pub fn in_port(port: u32) -> Self {
        Self::basic(field::IN_PORT, &port.to_be_bytes())
    }

    /// Ethertype
    #[must_use]
    pub fn eth_type(ethertype: u16) -> Self {
        Self::basic(field::ETH_TYPE, &ethertype.to_be_bytes())
    }

    /// Ethernet destination
    #[must_use]
    pub fn eth_dst(mac: [u8; 6]) -> Self {
        Self::basic(field::ETH_DST, &mac)
    }

    /// IPv4 destination under a mask
    #[must_use]
    pub fn ipv4_dst(addr: [u8; 4], mask: [u8; 4]) -> Self {
        Self::basic_masked(field::IPV4_DST, &addr, &mask)
    }

    /// Value part, without any mask
    #[must_use]
    pub fn value(&self) -> &[u8] {
        if self.has_mask { &self.value[..self.value.len() / 2] } else { &self.value }
    }

    /// Mask part, if present
    #[must_use]
    pub fn mask(&self) -> Option<&[u8]> {
        self.has_mask.then(|| &self.value[self.value.len() / 2..])
    }
}

impl Wire for OxmField {
    const ITEM: Item = Item::OxmField;

    fn bytes(&self) -> usize {
        4 + self.value.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let len = u8::try_from(self.value.len()).map_err(|_| ProtocolError::Excess(Item::OxmField))?;
        room(view, self.bytes(), Item::OxmField)?;
        view.put(self.class);
        view.put((self.field << 1) | u8::from(self.has_mask));
        view.put(len);
        view.put_bytes(&self.value);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::OxmField)?;
        let class = view.get();
        let packed: u8 = view.get();
        let len: u8 = view.get();
        need(view, usize::from(len), Item::OxmField)?;
        let value = Bytes::copy_from_slice(view.get_bytes(usize::from(len)));
        Ok(Self { class, field: packed >> 1, has_mask: packed & 1 == 1, value })
    }

    fn validate(&self) -> Result<()> {
        let bad = self.field > 0x7f
            || self.value.is_empty()
            || self.value.len() > usize::from(u8::MAX)
            || (self.has_mask && self.value.len() % 2 != 0);
        if bad { Err(ProtocolError::Bad(Item::OxmField)) } else { Ok(()) }
    }
}

/// Flow match: OXM fields, padded to 8 bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    /// Match fields in order
    pub fields: Sequence<OxmField>,
}

impl Match {
    /// The only match type this protocol version defines
    pub const TYPE_OXM: u16 = 1;

    /// Match on `fields`
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = OxmField>) -> Self {
        Self { fields: fields.into_iter().collect() }
    }

    /// Value of the length field: header plus fields, without padding
    #[must_use]
    pub fn length(&self) -> usize {
        4 + self.fields.bytes()
    }

    fn padding(&self) -> usize {
        (8 - self.length() % 8) % 8
    }
}

impl Wire for Match {
    const ITEM: Item = Item::Match;

    fn bytes(&self) -> usize {
        self.length() + self.padding()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let length = u16::try_from(self.length()).map_err(|_| ProtocolError::Excess(Item::Match))?;
        room(view, self.bytes(), Item::Match)?;
        view.put(Self::TYPE_OXM);
        view.put(length);
        self.fields.encode(view)?;
        view.pad(self.padding());
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Match)?;
        let kind: u16 = view.get();
        let length: u16 = view.get();
        if kind != Self::TYPE_OXM {
            return Err(ProtocolError::Bad(Item::Match));
        }
        let fields_len = usize::from(length).checked_sub(4).ok_or(ProtocolError::Bad(Item::Match))?;
        need(view, fields_len, Item::Match)?;

        let mut sub = view.constrain(fields_len);
        let fields = Sequence::decode(&mut sub)?;
        if !view.update(&sub) {
            return Err(ProtocolError::Excess(Item::Match));
        }

        let this = Self { fields };
        need(view, this.padding(), Item::Match)?;
        view.pad(this.padding());
        Ok(this)
    }

    fn validate(&self) -> Result<()> {
        self.fields.validate()
    }
}
