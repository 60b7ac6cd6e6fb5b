//! Actions applied to packets by flow entries, buckets and packet-outs.
//!
//! Every action is an [`Action`] element: a 4-byte type/length header and a
//! body padded so the whole action is a multiple of 8 bytes.

use bytes::Bytes;

use crate::{
    Item,
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    element::{Element, TlvHeader, TlvTag},
    errors::{ProtocolError, Result},
    oxm::OxmField,
    types::{group_id, port_no},
    variant::{payload_enum, wire_enum},
};

wire_enum! {
    /// Action type field
    pub enum ActionType: u16 {
        /// Forward to a port
        Output = 0,
        /// Copy TTL outwards
        CopyTtlOut = 11,
        /// Copy TTL inwards
        CopyTtlIn = 12,
        /// Set MPLS TTL
        SetMplsTtl = 15,
        /// Decrement MPLS TTL
        DecMplsTtl = 16,
        /// Push a VLAN tag
        PushVlan = 17,
        /// Pop the outer VLAN tag
        PopVlan = 18,
        /// Push an MPLS label
        PushMpls = 19,
        /// Pop the outer MPLS label
        PopMpls = 20,
        /// Set the output queue
        SetQueue = 21,
        /// Apply a group
        Group = 22,
        /// Set IP TTL
        SetNwTtl = 23,
        /// Decrement IP TTL
        DecNwTtl = 24,
        /// Rewrite a header field
        SetField = 25,
        /// Vendor action
        Experimenter = 0xffff,
    }
}

impl TlvTag for ActionType {
    const HEADER_ITEM: Item = Item::ActionHeader;
}

/// Action header
pub type ActionHeader = TlvHeader<ActionType>;

/// One action
pub type Action = Element<ActionHeader, ActionBody>;

payload_enum! {
    /// Action bodies keyed by [`ActionType`]
    pub enum ActionBody: ActionType, Item::Action {
        /// Forward to a port
        Output(Output),
        /// Set MPLS TTL
        SetMplsTtl(Ttl),
        /// Push a VLAN tag
        PushVlan(PushTag),
        /// Push an MPLS label
        PushMpls(PushTag),
        /// Pop the outer MPLS label
        PopMpls(PopMpls),
        /// Set the output queue
        SetQueue(SetQueue),
        /// Apply a group
        Group(GroupAction),
        /// Set IP TTL
        SetNwTtl(Ttl),
        /// Rewrite a header field
        SetField(SetField),
        /// Vendor action
        Experimenter(Experimenter),
    }
    empty(4) {
        /// Copy TTL outwards
        CopyTtlOut,
        /// Copy TTL inwards
        CopyTtlIn,
        /// Decrement MPLS TTL
        DecMplsTtl,
        /// Pop the outer VLAN tag
        PopVlan,
        /// Decrement IP TTL
        DecNwTtl,
    }
}

/// Forward to a port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Output {
    /// Output port
    pub port: u32,
    /// Bytes to send to the controller when `port` is the controller
    pub max_len: u16,
}

impl Output {
    /// `max_len` meaning "send the whole packet, do not buffer"
    pub const NO_BUFFER: u16 = 0xffff;
}

impl Wire for Output {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        12
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 12, Item::Action)?;
        view.put(self.port);
        view.put(self.max_len);
        view.pad(6);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 12, Item::Action)?;
        let port = view.get();
        let max_len = view.get();
        view.pad(6);
        Ok(Self { port, max_len })
    }

    fn validate(&self) -> Result<()> {
        if port_no::is_output(self.port) { Ok(()) } else { Err(ProtocolError::Bad(Item::Action)) }
    }
}

/// New TTL value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ttl {
    /// TTL
    pub ttl: u8,
}

impl Wire for Ttl {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Action)?;
        view.put(self.ttl);
        view.pad(3);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Action)?;
        let ttl = view.get();
        view.pad(3);
        Ok(Self { ttl })
    }
}

/// Ethertype of a pushed VLAN or MPLS tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushTag {
    /// Ethertype
    pub ethertype: u16,
}

impl PushTag {
    /// 802.1Q VLAN
    pub const VLAN: u16 = 0x8100;
    /// 802.1ad provider bridging
    pub const QINQ: u16 = 0x88a8;
    /// MPLS unicast
    pub const MPLS: u16 = 0x8847;
    /// MPLS multicast
    pub const MPLS_MULTICAST: u16 = 0x8848;
}

impl Wire for PushTag {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Action)?;
        view.put(self.ethertype);
        view.pad(2);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Action)?;
        let ethertype = view.get();
        view.pad(2);
        Ok(Self { ethertype })
    }

    fn validate(&self) -> Result<()> {
        match self.ethertype {
            Self::VLAN | Self::QINQ | Self::MPLS | Self::MPLS_MULTICAST => Ok(()),
            _ => Err(ProtocolError::Bad(Item::Action)),
        }
    }
}

/// Ethertype of the payload once the MPLS label is popped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopMpls {
    /// Ethertype
    pub ethertype: u16,
}

impl Wire for PopMpls {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Action)?;
        view.put(self.ethertype);
        view.pad(2);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Action)?;
        let ethertype = view.get();
        view.pad(2);
        Ok(Self { ethertype })
    }
}

/// Output queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetQueue {
    /// Queue id
    pub queue_id: u32,
}

impl Wire for SetQueue {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Action)?;
        view.put(self.queue_id);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Action)?;
        Ok(Self { queue_id: view.get() })
    }
}

/// Group to process the packet through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupAction {
    /// Group id
    pub group_id: u32,
}

impl Wire for GroupAction {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::Action)?;
        view.put(self.group_id);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Action)?;
        Ok(Self { group_id: view.get() })
    }

    fn validate(&self) -> Result<()> {
        if self.group_id <= group_id::MAX { Ok(()) } else { Err(ProtocolError::Bad(Item::Action)) }
    }
}

/// Header field rewrite, padded to an 8-byte boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetField {
    /// Field and new value
    pub field: OxmField,
}

impl SetField {
    fn padding(&self) -> usize {
        // Pads the whole action (4-byte header included) to 8 bytes.
        (8 - (4 + self.field.bytes()) % 8) % 8
    }
}

impl Wire for SetField {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        self.field.bytes() + self.padding()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::Action)?;
        self.field.encode(view)?;
        view.pad(self.padding());
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        let field = OxmField::decode(view)?;
        let this = Self { field };
        need(view, this.padding(), Item::Action)?;
        view.pad(this.padding());
        Ok(this)
    }

    fn validate(&self) -> Result<()> {
        if self.field.has_mask {
            return Err(ProtocolError::Bad(Item::Action));
        }
        self.field.validate()
    }
}

/// Vendor-defined body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Experimenter {
    /// Experimenter id
    pub experimenter: u32,
    /// Opaque vendor data
    pub data: Bytes,
}

impl Wire for Experimenter {
    const ITEM: Item = Item::Action;

    fn bytes(&self) -> usize {
        4 + self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::Action)?;
        view.put(self.experimenter);
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::Action)?;
        let experimenter = view.get();
        let data = Bytes::copy_from_slice(view.rest());
        Ok(Self { experimenter, data })
    }
}
