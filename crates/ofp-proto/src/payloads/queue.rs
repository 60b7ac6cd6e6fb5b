//! Queue configuration queries.

use bytes::Bytes;

use crate::{
    Item,
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    element::{Element, TlvHeader, TlvTag},
    errors::{ProtocolError, Result},
    sequence::Sequence,
    types::port_no,
    variant::{payload_enum, wire_enum},
};

wire_enum! {
    /// Queue property type
    pub enum QueuePropType: u16 {
        /// Guaranteed minimum rate
        MinRate = 1,
        /// Maximum rate
        MaxRate = 2,
        /// Vendor property
        Experimenter = 0xffff,
    }
}

impl TlvTag for QueuePropType {
    const HEADER_ITEM: Item = Item::PropertyHeader;
    const PAD: usize = 4;
}

/// Queue property header
pub type QueuePropHeader = TlvHeader<QueuePropType>;

/// One queue property
pub type QueueProp = Element<QueuePropHeader, QueuePropBody>;

payload_enum! {
    /// Property bodies keyed by [`QueuePropType`]
    pub enum QueuePropBody: QueuePropType, Item::QueueProperty {
        /// Guaranteed minimum rate
        MinRate(Rate),
        /// Maximum rate
        MaxRate(Rate),
        /// Vendor property
        Experimenter(PropExperimenter),
    }
    empty(0) {}
}

/// Rate in tenths of a percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rate {
    /// Per mille of link rate, or [`Rate::DISABLED`]
    pub rate: u16,
}

impl Rate {
    /// Highest meaningful rate
    pub const MAX: u16 = 1000;
    /// Rate left unconfigured
    pub const DISABLED: u16 = 0xffff;
}

impl Wire for Rate {
    const ITEM: Item = Item::QueueProperty;

    fn bytes(&self) -> usize {
        8
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 8, Item::QueueProperty)?;
        view.put(self.rate);
        view.pad(6);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::QueueProperty)?;
        let rate = view.get();
        view.pad(6);
        Ok(Self { rate })
    }

    fn validate(&self) -> Result<()> {
        if self.rate <= Self::MAX || self.rate == Self::DISABLED {
            Ok(())
        } else {
            Err(ProtocolError::Bad(Item::QueueProperty))
        }
    }
}

/// Vendor queue property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropExperimenter {
    /// Experimenter id
    pub experimenter: u32,
    /// Opaque data
    pub data: Bytes,
}

impl Wire for PropExperimenter {
    const ITEM: Item = Item::QueueProperty;

    fn bytes(&self) -> usize {
        8 + self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::QueueProperty)?;
        view.put(self.experimenter);
        view.pad(4);
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::QueueProperty)?;
        let experimenter = view.get();
        view.pad(4);
        Ok(Self { experimenter, data: Bytes::copy_from_slice(view.rest()) })
    }
}

/// One queue attached to a port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketQueue {
    /// Queue id
    pub queue_id: u32,
    /// Port the queue is attached to
    pub port: u32,
    /// Queue properties
    pub properties: Sequence<QueueProp>,
}

impl PacketQueue {
    const FIXED_LEN: usize = 16;
}

impl Wire for PacketQueue {
    const ITEM: Item = Item::PacketQueue;

    fn bytes(&self) -> usize {
        Self::FIXED_LEN + self.properties.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let len = u16::try_from(self.bytes()).map_err(|_| ProtocolError::Excess(Item::PacketQueue))?;
        room(view, self.bytes(), Item::PacketQueue)?;
        view.put(self.queue_id);
        view.put(self.port);
        view.put(len);
        view.pad(6);
        self.properties.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, Self::FIXED_LEN, Item::PacketQueue)?;
        let queue_id = view.get();
        let port = view.get();
        let len = usize::from(view.get::<u16>());
        view.pad(6);
        let props_len = len.checked_sub(Self::FIXED_LEN).ok_or(ProtocolError::Bad(Item::PacketQueue))?;
        need(view, props_len, Item::PacketQueue)?;

        let mut sub = view.constrain(props_len);
        let properties = Sequence::decode(&mut sub)?;
        if !view.update(&sub) {
            return Err(ProtocolError::Excess(Item::PacketQueue));
        }
        Ok(Self { queue_id, port, properties })
    }

    fn validate(&self) -> Result<()> {
        self.properties.validate()
    }
}

/// Ask for the queues of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueGetConfigRequest {
    /// Port to query, or [`port_no::ANY`]
    pub port: u32,
}

impl Default for QueueGetConfigRequest {
    fn default() -> Self {
        Self { port: port_no::ANY }
    }
}

impl Wire for QueueGetConfigRequest {
    const ITEM: Item = Item::QueueConfig;

    fn bytes(&self) -> usize {
        8
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 8, Item::QueueConfig)?;
        view.put(self.port);
        view.pad(4);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::QueueConfig)?;
        let port = view.get();
        view.pad(4);
        Ok(Self { port })
    }

    fn validate(&self) -> Result<()> {
        if self.port <= port_no::MAX || self.port == port_no::ANY {
            Ok(())
        } else {
            Err(ProtocolError::Bad(Item::QueueConfig))
        }
    }
}

/// Queues configured on a port
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueGetConfigReply {
    /// Port that was queried
    pub port: u32,
    /// Configured queues
    pub queues: Sequence<PacketQueue>,
}

impl Wire for QueueGetConfigReply {
    const ITEM: Item = Item::QueueConfig;

    fn bytes(&self) -> usize {
        8 + self.queues.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::QueueConfig)?;
        view.put(self.port);
        view.pad(4);
        self.queues.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::QueueConfig)?;
        let port = view.get();
        view.pad(4);
        Ok(Self { port, queues: Sequence::decode(view)? })
    }

    fn validate(&self) -> Result<()> {
        self.queues.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_bytes, to_bytes};

    fn queue(queue_id: u32) -> PacketQueue {
        PacketQueue {
            queue_id,
            port: 1,
            properties: [
                QueueProp::new(QueuePropBody::MinRate(Rate { rate: 100 })),
                QueueProp::new(QueuePropBody::MaxRate(Rate { rate: Rate::DISABLED })),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn property_header_is_eight_bytes() {
        let prop = QueueProp::new(QueuePropBody::MinRate(Rate { rate: 500 }));
        assert_eq!(hex::encode(to_bytes(&prop).unwrap()), "000100100000000001f4000000000000");
    }

    #[test]
    fn reply_round_trip() {
        let reply = QueueGetConfigReply { port: 1, queues: [queue(1), queue(2)].into_iter().collect() };
        let bytes = to_bytes(&reply).unwrap();
        assert_eq!(bytes.len(), 8 + 2 * (16 + 32));
        assert_eq!(from_bytes::<QueueGetConfigReply>(&bytes).unwrap(), reply);
        reply.validate().unwrap();
    }

    #[test]
    fn rate_above_limit_is_bad() {
        let prop = QueueProp::new(QueuePropBody::MaxRate(Rate { rate: 1001 }));
        assert_eq!(prop.validate(), Err(ProtocolError::Bad(Item::QueueProperty)));
    }

    #[test]
    fn queue_length_below_fixed_part_is_bad() {
        let mut bytes = to_bytes(&queue(1)).unwrap().to_vec();
        bytes[9] = 4;
        assert_eq!(from_bytes::<PacketQueue>(&bytes), Err(ProtocolError::Bad(Item::PacketQueue)));
    }

    #[test]
    fn request_port_range() {
        QueueGetConfigRequest::default().validate().unwrap();
        QueueGetConfigRequest { port: 4 }.validate().unwrap();
        let request = QueueGetConfigRequest { port: port_no::CONTROLLER };
        assert_eq!(request.validate(), Err(ProtocolError::Bad(Item::QueueConfig)));
    }
}
