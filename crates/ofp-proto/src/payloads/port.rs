//! Port descriptions, port status notices and port modification.

use crate::{
    Item, PortConfig, PortFeatures, PortState,
    buffer::{View, ViewMut},
    codec::{Wire, need, read_str, room, write_str},
    errors::{ProtocolError, Result},
    types::port_no,
    variant::{Tag, wire_enum},
};

/// Length of the port name field, including its NUL
pub const NAME_LEN: usize = 16;

/// Port description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Port {
    /// Port number
    pub port_no: u32,
    /// Hardware address
    pub hw_addr: [u8; 6],
    /// Interface name, at most 15 bytes
    pub name: String,
    /// Administrative settings
    pub config: PortConfig,
    /// Link state
    pub state: PortState,
    /// Current features
    pub curr: PortFeatures,
    /// Advertised features
    pub advertised: PortFeatures,
    /// Supported features
    pub supported: PortFeatures,
    /// Features advertised by the peer
    pub peer: PortFeatures,
    /// Current bitrate in kbps
    pub curr_speed: u32,
    /// Maximum bitrate in kbps
    pub max_speed: u32,
}

impl Port {
    /// Encoded size
    pub const SIZE: usize = 64;
}

impl Wire for Port {
    const ITEM: Item = Item::Port;

    fn bytes(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, Self::SIZE, Item::Port)?;
        view.put(self.port_no);
        view.pad(4);
        view.put(self.hw_addr);
        view.pad(2);
        write_str::<NAME_LEN>(&self.name, view);
        view.put(self.config.bits());
        view.put(self.state.bits());
        view.put(self.curr.bits());
        view.put(self.advertised.bits());
        view.put(self.supported.bits());
        view.put(self.peer.bits());
        view.put(self.curr_speed);
        view.put(self.max_speed);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, Self::SIZE, Item::Port)?;
        let port_no = view.get();
        view.pad(4);
        let hw_addr = view.get();
        view.pad(2);
        Ok(Self {
            port_no,
            hw_addr,
            name: read_str::<NAME_LEN>(view),
            config: PortConfig::from_bits_retain(view.get()),
            state: PortState::from_bits_retain(view.get()),
            curr: PortFeatures::from_bits_retain(view.get()),
            advertised: PortFeatures::from_bits_retain(view.get()),
            supported: PortFeatures::from_bits_retain(view.get()),
            peer: PortFeatures::from_bits_retain(view.get()),
            curr_speed: view.get(),
            max_speed: view.get(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.name.len() < NAME_LEN { Ok(()) } else { Err(ProtocolError::Bad(Item::Port)) }
    }
}

wire_enum! {
    /// What happened to a port
    pub enum PortReason: u8 {
        /// Port was added
        Add = 0,
        /// Port was removed
        Delete = 1,
        /// Some attribute changed
        Modify = 2,
    }
}

/// Port added, removed or changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatus {
    /// What happened
    pub reason: PortReason,
    /// Port after the change
    pub desc: Port,
}

impl Default for PortStatus {
    fn default() -> Self {
        Self { reason: PortReason::Add, desc: Port::default() }
    }
}

impl Wire for PortStatus {
    const ITEM: Item = Item::PortStatus;

    fn bytes(&self) -> usize {
        8 + Port::SIZE
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::PortStatus)?;
        view.put(self.reason.to_raw());
        view.pad(7);
        self.desc.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::PortStatus)?;
        let reason = PortReason::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::PortStatus))?;
        view.pad(7);
        Ok(Self { reason, desc: Port::decode(view)? })
    }

    fn validate(&self) -> Result<()> {
        self.desc.validate()
    }
}

/// Port behaviour modification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortMod {
    /// Port to modify
    pub port_no: u32,
    /// Hardware address, must match the port's
    pub hw_addr: [u8; 6],
    /// New config bits
    pub config: PortConfig,
    /// Config bits to change
    pub mask: PortConfig,
    /// Features to advertise, empty to leave unchanged
    pub advertise: PortFeatures,
}

impl Wire for PortMod {
    const ITEM: Item = Item::PortMod;

    fn bytes(&self) -> usize {
        32
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 32, Item::PortMod)?;
        view.put(self.port_no);
        view.pad(4);
        view.put(self.hw_addr);
        view.pad(2);
        view.put(self.config.bits());
        view.put(self.mask.bits());
        view.put(self.advertise.bits());
        view.pad(4);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 32, Item::PortMod)?;
        let port_no = view.get();
        view.pad(4);
        let hw_addr = view.get();
        view.pad(2);
        let config = PortConfig::from_bits_retain(view.get());
        let mask = PortConfig::from_bits_retain(view.get());
        let advertise = PortFeatures::from_bits_retain(view.get());
        view.pad(4);
        Ok(Self { port_no, hw_addr, config, mask, advertise })
    }

    fn validate(&self) -> Result<()> {
        let known = |bits: PortConfig| PortConfig::from_bits(bits.bits()).is_some();
        if self.port_no == 0 || self.port_no > port_no::MAX || !known(self.config) || !known(self.mask) {
            return Err(ProtocolError::Bad(Item::PortMod));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_bytes, to_bytes};

    fn port() -> Port {
        Port {
            port_no: 1,
            hw_addr: [0, 1, 2, 3, 4, 5],
            name: "eth1".into(),
            state: PortState::LIVE,
            curr: PortFeatures::RATE_1GB_FD | PortFeatures::COPPER,
            curr_speed: 1_000_000,
            max_speed: 1_000_000,
            ..Port::default()
        }
    }

    #[test]
    fn port_status_is_seventy_two_bytes() {
        let status = PortStatus { reason: PortReason::Modify, desc: port() };
        let bytes = to_bytes(&status).unwrap();
        assert_eq!(bytes.len(), 72);
        assert_eq!(&bytes[24..29], b"eth1\0");
        assert_eq!(from_bytes::<PortStatus>(&bytes).unwrap(), status);
    }

    #[test]
    fn long_name_fails_validation() {
        let mut desc = port();
        desc.name = "a-very-long-interface".into();
        assert_eq!(desc.validate(), Err(ProtocolError::Bad(Item::Port)));
    }

    #[test]
    fn port_mod_rules() {
        let mut port_mod = PortMod { port_no: 3, config: PortConfig::PORT_DOWN, mask: PortConfig::PORT_DOWN, ..PortMod::default() };
        port_mod.validate().unwrap();
        assert_eq!(from_bytes::<PortMod>(&to_bytes(&port_mod).unwrap()).unwrap(), port_mod);

        port_mod.port_no = port_no::CONTROLLER;
        assert_eq!(port_mod.validate(), Err(ProtocolError::Bad(Item::PortMod)));

        port_mod.port_no = 3;
        port_mod.mask = PortConfig::from_bits_retain(1 << 20);
        assert_eq!(port_mod.validate(), Err(ProtocolError::Bad(Item::PortMod)));
    }
}
