//! Connection-level messages: hello, errors, echo, features, config, role.

use bytes::Bytes;

use crate::{
    Capabilities, ConfigFlags, Item,
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    errors::{ProtocolError, Result},
    variant::{Tag, wire_enum},
};

/// Version negotiation; the element list is carried opaque
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hello {
    /// Raw hello elements
    pub elements: Bytes,
}

impl Wire for Hello {
    const ITEM: Item = Item::Message;

    fn bytes(&self) -> usize {
        self.elements.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::Message)?;
        view.put_bytes(&self.elements);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        Ok(Self { elements: Bytes::copy_from_slice(view.rest()) })
    }
}

wire_enum! {
    /// Error class
    pub enum ErrorType: u16 {
        /// Hello negotiation failed
        HelloFailed = 0,
        /// Request was not understood
        BadRequest = 1,
        /// Error in an action
        BadAction = 2,
        /// Error in an instruction
        BadInstruction = 3,
        /// Error in a match
        BadMatch = 4,
        /// Flow-mod failed
        FlowModFailed = 5,
        /// Group-mod failed
        GroupModFailed = 6,
        /// Port-mod failed
        PortModFailed = 7,
        /// Table-mod failed
        TableModFailed = 8,
        /// Queue operation failed
        QueueOpFailed = 9,
        /// Switch config request failed
        SwitchConfigFailed = 10,
        /// Role request failed
        RoleRequestFailed = 11,
        /// Meter-mod failed
        MeterModFailed = 12,
        /// Table features request failed
        TableFeaturesFailed = 13,
        /// Vendor error
        Experimenter = 0xffff,
    }
}

/// Codes for [`ErrorType::BadRequest`]
pub mod bad_request {
    /// Version not supported
    pub const BAD_VERSION: u16 = 0;
    /// Message type not supported
    pub const BAD_TYPE: u16 = 1;
    /// Wrong request length
    pub const BAD_LEN: u16 = 6;
    /// Denied because the controller is a slave
    pub const IS_SLAVE: u16 = 10;
}

/// Codes for [`ErrorType::RoleRequestFailed`]
pub mod role_request_failed {
    /// Stale generation id
    pub const STALE: u16 = 0;
    /// Role change not supported
    pub const UNSUP: u16 = 1;
    /// Invalid role
    pub const BAD_ROLE: u16 = 2;
}

/// Error report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMsg {
    /// Error class
    pub kind: ErrorType,
    /// Class-specific code
    pub code: u16,
    /// At least 64 bytes of the failed request, or free-form data
    pub data: Bytes,
}

impl ErrorMsg {
    /// Bytes of the offending request echoed back in an error
    pub const ECHO_LEN: usize = 64;

    /// Error carrying up to [`Self::ECHO_LEN`] bytes of `request`
    #[must_use]
    pub fn new(kind: ErrorType, code: u16, request: &[u8]) -> Self {
        let len = request.len().min(Self::ECHO_LEN);
        Self { kind, code, data: Bytes::copy_from_slice(&request[..len]) }
    }

    /// Rejection of a mutating request from a slave controller
    #[must_use]
    pub fn is_slave(request: &[u8]) -> Self {
        Self::new(ErrorType::BadRequest, bad_request::IS_SLAVE, request)
    }

    /// Rejection of a role request with an old generation id
    #[must_use]
    pub fn stale_role(request: &[u8]) -> Self {
        Self::new(ErrorType::RoleRequestFailed, role_request_failed::STALE, request)
    }
}

impl Default for ErrorMsg {
    fn default() -> Self {
        Self { kind: ErrorType::HelloFailed, code: 0, data: Bytes::new() }
    }
}

impl Wire for ErrorMsg {
    const ITEM: Item = Item::ErrorMsg;

    fn bytes(&self) -> usize {
        4 + self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::ErrorMsg)?;
        view.put(self.kind.to_raw());
        view.put(self.code);
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::ErrorMsg)?;
        let kind = ErrorType::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::ErrorMsg))?;
        let code = view.get();
        Ok(Self { kind, code, data: Bytes::copy_from_slice(view.rest()) })
    }
}

/// Echo request or reply payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Echo {
    /// Arbitrary data, copied into the reply
    pub data: Bytes,
}

impl Wire for Echo {
    const ITEM: Item = Item::Message;

    fn bytes(&self) -> usize {
        self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::Message)?;
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        Ok(Self { data: Bytes::copy_from_slice(view.rest()) })
    }
}

/// Vendor message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimenterMsg {
    /// Experimenter id
    pub experimenter: u32,
    /// Vendor-defined type
    pub exp_type: u32,
    /// Opaque vendor data
    pub data: Bytes,
}

impl Wire for ExperimenterMsg {
    const ITEM: Item = Item::Message;

    fn bytes(&self) -> usize {
        8 + self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::Message)?;
        view.put(self.experimenter);
        view.put(self.exp_type);
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::Message)?;
        let experimenter = view.get();
        let exp_type = view.get();
        Ok(Self { experimenter, exp_type, data: Bytes::copy_from_slice(view.rest()) })
    }
}

/// Switch identity and capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturesReply {
    /// Datapath id
    pub datapath_id: u64,
    /// Packets the switch can buffer at once
    pub n_buffers: u32,
    /// Number of flow tables
    pub n_tables: u8,
    /// Auxiliary connection id, 0 for the main connection
    pub auxiliary_id: u8,
    /// Supported capabilities
    pub capabilities: Capabilities,
}

impl Wire for FeaturesReply {
    const ITEM: Item = Item::Features;

    fn bytes(&self) -> usize {
        24
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 24, Item::Features)?;
        view.put(self.datapath_id);
        view.put(self.n_buffers);
        view.put(self.n_tables);
        view.put(self.auxiliary_id);
        view.pad(2);
        view.put(self.capabilities.bits());
        view.pad(4);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 24, Item::Features)?;
        let datapath_id = view.get();
        let n_buffers = view.get();
        let n_tables = view.get();
        let auxiliary_id = view.get();
        view.pad(2);
        let capabilities = Capabilities::from_bits_retain(view.get());
        view.pad(4);
        Ok(Self { datapath_id, n_buffers, n_tables, auxiliary_id, capabilities })
    }

    fn validate(&self) -> Result<()> {
        if self.n_tables == 0 { Err(ProtocolError::Bad(Item::Features)) } else { Ok(()) }
    }
}

/// Switch configuration, used by get-config reply and set-config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchConfig {
    /// Fragment handling
    pub flags: ConfigFlags,
    /// Bytes of a table-miss packet to send to the controller
    pub miss_send_len: u16,
}

impl SwitchConfig {
    /// Default `miss_send_len`
    pub const DEFAULT_MISS_SEND_LEN: u16 = 128;
}

impl Wire for SwitchConfig {
    const ITEM: Item = Item::SwitchConfig;

    fn bytes(&self) -> usize {
        4
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 4, Item::SwitchConfig)?;
        view.put(self.flags.bits());
        view.put(self.miss_send_len);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 4, Item::SwitchConfig)?;
        let flags = ConfigFlags::from_bits_retain(view.get());
        let miss_send_len = view.get();
        Ok(Self { flags, miss_send_len })
    }

    fn validate(&self) -> Result<()> {
        if self.flags.is_valid() { Ok(()) } else { Err(ProtocolError::Bad(Item::SwitchConfig)) }
    }
}

wire_enum! {
    /// Controller role
    pub enum Role: u32 {
        /// Keep the current role
        NoChange = 0,
        /// Full access, shared with other equal controllers
        Equal = 1,
        /// Full access, exclusive
        Master = 2,
        /// Read-only access
        Slave = 3,
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Equal
    }
}

/// Role request or reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMsg {
    /// Requested or current role
    pub role: Role,
    /// Master election generation, meaningful for master and slave
    pub generation_id: u64,
}

impl RoleMsg {
    /// True if the generation id takes part in staleness checks
    #[must_use]
    pub const fn is_election(&self) -> bool {
        matches!(self.role, Role::Master | Role::Slave)
    }
}

impl Wire for RoleMsg {
    const ITEM: Item = Item::Role;

    fn bytes(&self) -> usize {
        16
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 16, Item::Role)?;
        view.put(self.role.to_raw());
        view.pad(4);
        view.put(self.generation_id);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 16, Item::Role)?;
        let role = Role::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::Role))?;
        view.pad(4);
        let generation_id = view.get();
        Ok(Self { role, generation_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_bytes, to_bytes};

    #[test]
    fn error_echo_is_capped() {
        let request = [0xab; 100];
        let err = ErrorMsg::is_slave(&request);
        assert_eq!(err.kind, ErrorType::BadRequest);
        assert_eq!(err.code, bad_request::IS_SLAVE);
        assert_eq!(err.data.len(), ErrorMsg::ECHO_LEN);

        let short = ErrorMsg::stale_role(&[1, 2, 3]);
        assert_eq!(short.data.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn unknown_error_type_is_bad() {
        assert_eq!(from_bytes::<ErrorMsg>(&[0x00, 0x63, 0, 0]), Err(ProtocolError::Bad(Item::ErrorMsg)));
    }

    #[test]
    fn features_layout() {
        let features = FeaturesReply {
            datapath_id: 0x0102_0304_0506_0708,
            n_buffers: 256,
            n_tables: 4,
            auxiliary_id: 0,
            capabilities: Capabilities::FLOW_STATS | Capabilities::PORT_STATS,
        };
        assert_eq!(
            hex::encode(to_bytes(&features).unwrap()),
            "010203040506070800000100040000000000000500000000"
        );
        features.validate().unwrap();
        assert_eq!(FeaturesReply::default().validate(), Err(ProtocolError::Bad(Item::Features)));
    }

    #[test]
    fn config_flags_are_validated() {
        let mut config = SwitchConfig { flags: ConfigFlags::FRAG_REASM, miss_send_len: 128 };
        config.validate().unwrap();
        config.flags = ConfigFlags::from_bits_retain(3);
        assert_eq!(config.validate(), Err(ProtocolError::Bad(Item::SwitchConfig)));
    }

    #[test]
    fn role_round_trip() {
        let msg = RoleMsg { role: Role::Slave, generation_id: 42 };
        assert!(msg.is_election());
        let bytes = to_bytes(&msg).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(from_bytes::<RoleMsg>(&bytes).unwrap(), msg);
        assert_eq!(from_bytes::<RoleMsg>(&[0, 0, 0, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]), Err(ProtocolError::Bad(Item::Role)));
    }
}
