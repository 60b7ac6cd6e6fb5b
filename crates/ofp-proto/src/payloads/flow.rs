//! Flow table programming and the packet path between switch and controller.

use std::collections::BTreeSet;

use bytes::Bytes;

use crate::{
    FlowModFlags, Item,
    action::Action,
    buffer::{View, ViewMut},
    codec::{Wire, need, room},
    errors::{ProtocolError, Result},
    instruction::{Instruction, InstructionBody},
    oxm::Match,
    sequence::Sequence,
    types::{NO_BUFFER, group_id, port_no, table_id},
    variant::{Tag, wire_enum},
};

wire_enum! {
    /// Why a packet was sent to the controller
    pub enum PacketInReason: u8 {
        /// No matching flow (table-miss)
        NoMatch = 0,
        /// Explicit output to the controller
        Action = 1,
        /// Packet had an invalid TTL
        InvalidTtl = 2,
    }
}

/// Packet sent to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    /// Switch buffer holding the packet, or [`NO_BUFFER`]
    pub buffer_id: u32,
    /// Full length of the frame
    pub total_len: u16,
    /// Reason the packet is being sent
    pub reason: PacketInReason,
    /// Table that was looked up
    pub table_id: u8,
    /// Cookie of the flow entry that sent the packet
    pub cookie: u64,
    /// Packet metadata, at least the ingress port
    pub pattern: Match,
    /// Packet data, possibly truncated
    pub data: Bytes,
}

impl Default for PacketIn {
    fn default() -> Self {
        Self {
            buffer_id: NO_BUFFER,
            total_len: 0,
            reason: PacketInReason::NoMatch,
            table_id: 0,
            cookie: 0,
            pattern: Match::default(),
            data: Bytes::new(),
        }
    }
}

impl Wire for PacketIn {
    const ITEM: Item = Item::PacketIn;

    fn bytes(&self) -> usize {
        16 + self.pattern.bytes() + 2 + self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::PacketIn)?;
        view.put(self.buffer_id);
        view.put(self.total_len);
        view.put(self.reason.to_raw());
        view.put(self.table_id);
        view.put(self.cookie);
        self.pattern.encode(view)?;
        view.pad(2);
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 16, Item::PacketIn)?;
        let buffer_id = view.get();
        let total_len = view.get();
        let reason = PacketInReason::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::PacketIn))?;
        let table_id = view.get();
        let cookie = view.get();
        let pattern = Match::decode(view)?;
        need(view, 2, Item::PacketIn)?;
        view.pad(2);
        let data = Bytes::copy_from_slice(view.rest());
        Ok(Self { buffer_id, total_len, reason, table_id, cookie, pattern, data })
    }

    fn validate(&self) -> Result<()> {
        self.pattern.validate()
    }
}

wire_enum! {
    /// Why a flow entry was removed
    pub enum FlowRemovedReason: u8 {
        /// Idle timeout expired
        IdleTimeout = 0,
        /// Hard timeout expired
        HardTimeout = 1,
        /// Deleted by a flow-mod
        Delete = 2,
        /// Group was deleted
        GroupDelete = 3,
    }
}

/// Flow entry removal notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRemoved {
    /// Entry cookie
    pub cookie: u64,
    /// Entry priority
    pub priority: u16,
    /// Removal reason
    pub reason: FlowRemovedReason,
    /// Table the entry lived in
    pub table_id: u8,
    /// Seconds the entry was alive
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`
    pub duration_nsec: u32,
    /// Idle timeout from the original flow-mod
    pub idle_timeout: u16,
    /// Hard timeout from the original flow-mod
    pub hard_timeout: u16,
    /// Packets matched
    pub packet_count: u64,
    /// Bytes matched
    pub byte_count: u64,
    /// Entry match
    pub pattern: Match,
}

impl Default for FlowRemoved {
    fn default() -> Self {
        Self {
            cookie: 0,
            priority: 0,
            reason: FlowRemovedReason::IdleTimeout,
            table_id: 0,
            duration_sec: 0,
            duration_nsec: 0,
            idle_timeout: 0,
            hard_timeout: 0,
            packet_count: 0,
            byte_count: 0,
            pattern: Match::default(),
        }
    }
}

impl Wire for FlowRemoved {
    const ITEM: Item = Item::FlowRemoved;

    fn bytes(&self) -> usize {
        40 + self.pattern.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::FlowRemoved)?;
        view.put(self.cookie);
        view.put(self.priority);
        view.put(self.reason.to_raw());
        view.put(self.table_id);
        view.put(self.duration_sec);
        view.put(self.duration_nsec);
        view.put(self.idle_timeout);
        view.put(self.hard_timeout);
        view.put(self.packet_count);
        view.put(self.byte_count);
        self.pattern.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 40, Item::FlowRemoved)?;
        let cookie = view.get();
        let priority = view.get();
        let reason = FlowRemovedReason::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::FlowRemoved))?;
        Ok(Self {
            cookie,
            priority,
            reason,
            table_id: view.get(),
            duration_sec: view.get(),
            duration_nsec: view.get(),
            idle_timeout: view.get(),
            hard_timeout: view.get(),
            packet_count: view.get(),
            byte_count: view.get(),
            pattern: Match::decode(view)?,
        })
    }

    fn validate(&self) -> Result<()> {
        self.pattern.validate()
    }
}

/// Packet injected by the controller.
///
/// Either the packet is taken from a switch buffer (`buffer_id` set, no data)
/// or it is carried inline (`buffer_id` is [`NO_BUFFER`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketOut {
    /// Switch buffer to release, or [`NO_BUFFER`]
    pub buffer_id: u32,
    /// Ingress port to assume for the packet
    pub in_port: u32,
    /// Actions applied before output
    pub actions: Sequence<Action>,
    /// Inline packet data
    pub data: Bytes,
}

impl Default for PacketOut {
    fn default() -> Self {
        Self { buffer_id: NO_BUFFER, in_port: port_no::CONTROLLER, actions: Sequence::new(), data: Bytes::new() }
    }
}

impl Wire for PacketOut {
    const ITEM: Item = Item::PacketOut;

    fn bytes(&self) -> usize {
        16 + self.actions.bytes() + self.data.len()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        let actions_len = u16::try_from(self.actions.bytes()).map_err(|_| ProtocolError::Excess(Item::PacketOut))?;
        room(view, self.bytes(), Item::PacketOut)?;
        view.put(self.buffer_id);
        view.put(self.in_port);
        view.put(actions_len);
        view.pad(6);
        self.actions.encode(view)?;
        view.put_bytes(&self.data);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 16, Item::PacketOut)?;
        let buffer_id = view.get();
        let in_port = view.get();
        let actions_len: u16 = view.get();
        view.pad(6);
        let actions = Sequence::decode_bounded(view, usize::from(actions_len))?;
        Ok(Self { buffer_id, in_port, actions, data: Bytes::copy_from_slice(view.rest()) })
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_id != NO_BUFFER && !self.data.is_empty() {
            return Err(ProtocolError::Bad(Item::PacketOut));
        }
        self.actions.validate()
    }
}

wire_enum! {
    /// Flow-mod operation
    pub enum FlowModCommand: u8 {
        /// Add a flow entry
        Add = 0,
        /// Modify all matching entries
        Modify = 1,
        /// Modify the entry matching exactly
        ModifyStrict = 2,
        /// Delete all matching entries
        Delete = 3,
        /// Delete the entry matching exactly
        DeleteStrict = 4,
    }
}

impl FlowModCommand {
    /// True for the delete commands
    #[must_use]
    pub const fn is_delete(self) -> bool {
        matches!(self, Self::Delete | Self::DeleteStrict)
    }
}

/// Flow table modification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMod {
    /// Opaque controller cookie
    pub cookie: u64,
    /// Cookie bits that must match for modify and delete
    pub cookie_mask: u64,
    /// Target table, [`table_id::ALL`] only for deletes
    pub table_id: u8,
    /// Operation
    pub command: FlowModCommand,
    /// Seconds idle before removal, 0 for none
    pub idle_timeout: u16,
    /// Seconds before removal, 0 for none
    pub hard_timeout: u16,
    /// Entry priority
    pub priority: u16,
    /// Buffered packet to apply the entry to, or [`NO_BUFFER`]
    pub buffer_id: u32,
    /// Delete filter on output port
    pub out_port: u32,
    /// Delete filter on output group
    pub out_group: u32,
    /// Entry flags
    pub flags: FlowModFlags,
    /// Entry match
    pub pattern: Match,
    /// Entry instructions
    pub instructions: Sequence<Instruction>,
}

impl FlowMod {
    /// Priority used when none is given
    pub const DEFAULT_PRIORITY: u16 = 0x8000;

    /// Flow-mod adding an entry to `table_id`
    #[must_use]
    pub fn add(table_id: u8, pattern: Match, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        Self { table_id, pattern, instructions: instructions.into_iter().collect(), ..Self::default() }
    }

    /// Flow-mod deleting every entry in every table
    #[must_use]
    pub fn delete_all() -> Self {
        Self { table_id: table_id::ALL, command: FlowModCommand::Delete, ..Self::default() }
    }
}

impl Default for FlowMod {
    fn default() -> Self {
        Self {
            cookie: 0,
            cookie_mask: 0,
            table_id: 0,
            command: FlowModCommand::Add,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: Self::DEFAULT_PRIORITY,
            buffer_id: NO_BUFFER,
            out_port: port_no::ANY,
            out_group: group_id::ANY,
            flags: FlowModFlags::empty(),
            pattern: Match::default(),
            instructions: Sequence::new(),
        }
    }
}

impl Wire for FlowMod {
    const ITEM: Item = Item::FlowMod;

    fn bytes(&self) -> usize {
        40 + self.pattern.bytes() + self.instructions.bytes()
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, self.bytes(), Item::FlowMod)?;
        view.put(self.cookie);
        view.put(self.cookie_mask);
        view.put(self.table_id);
        view.put(self.command.to_raw());
        view.put(self.idle_timeout);
        view.put(self.hard_timeout);
        view.put(self.priority);
        view.put(self.buffer_id);
        view.put(self.out_port);
        view.put(self.out_group);
        view.put(self.flags.bits());
        view.pad(2);
        self.pattern.encode(view)?;
        self.instructions.encode(view)
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 40, Item::FlowMod)?;
        let cookie = view.get();
        let cookie_mask = view.get();
        let table_id = view.get();
        let command = FlowModCommand::from_raw(view.get()).ok_or(ProtocolError::Bad(Item::FlowMod))?;
        let idle_timeout = view.get();
        let hard_timeout = view.get();
        let priority = view.get();
        let buffer_id = view.get();
        let out_port = view.get();
        let out_group = view.get();
        let flags = FlowModFlags::from_bits_retain(view.get());
        view.pad(2);
        let pattern = Match::decode(view)?;
        let instructions = Sequence::decode(view)?;
        Ok(Self {
            cookie,
            cookie_mask,
            table_id,
            command,
            idle_timeout,
            hard_timeout,
            priority,
            buffer_id,
            out_port,
            out_group,
            flags,
            pattern,
            instructions,
        })
    }

    fn validate(&self) -> Result<()> {
        let bad = Err(ProtocolError::Bad(Item::FlowMod));
        if self.table_id == table_id::ALL && !self.command.is_delete() {
            return bad;
        }
        if FlowModFlags::from_bits(self.flags.bits()).is_none() {
            return bad;
        }

        let mut seen = BTreeSet::new();
        for instruction in &self.instructions {
            if !seen.insert(instruction.tag()) {
                return bad;
            }
            if let InstructionBody::GotoTable(goto) = instruction.payload() {
                if self.table_id != table_id::ALL && goto.table_id <= self.table_id {
                    return bad;
                }
            }
        }

        self.pattern.validate()?;
        self.instructions.validate()
    }
}

/// Table configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableMod {
    /// Table, or [`table_id::ALL`]
    pub table_id: u8,
    /// Table config bits
    pub config: u32,
}

impl TableMod {
    /// Config bits defined for this version
    pub const CONFIG_MASK: u32 = 0x3;
}

impl Wire for TableMod {
    const ITEM: Item = Item::TableMod;

    fn bytes(&self) -> usize {
        8
    }

    fn encode(&self, view: &mut ViewMut<'_>) -> Result<()> {
        room(view, 8, Item::TableMod)?;
        view.put(self.table_id);
        view.pad(3);
        view.put(self.config);
        Ok(())
    }

    fn decode(view: &mut View<'_>) -> Result<Self> {
        need(view, 8, Item::TableMod)?;
        let table_id = view.get();
        view.pad(3);
        Ok(Self { table_id, config: view.get() })
    }

    fn validate(&self) -> Result<()> {
        if self.config & !Self::CONFIG_MASK == 0 { Ok(()) } else { Err(ProtocolError::Bad(Item::TableMod)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ActionBody, OxmField, from_bytes,
        action::Output,
        instruction::{Actions, GotoTable},
        to_bytes,
    };

    fn output(port: u32) -> Action {
        Action::new(ActionBody::Output(Output { port, max_len: 0 }))
    }

    #[test]
    fn packet_out_layout() {
        let out = PacketOut { actions: [output(1)].into_iter().collect(), data: vec![0xaa, 0xbb].into(), ..PacketOut::default() };
        let bytes = to_bytes(&out).unwrap();
        assert_eq!(bytes.len(), 16 + 16 + 2);
        assert_eq!(
            hex::encode(&bytes[..16]),
            "fffffffffffffffd0010000000000000"
        );
        assert_eq!(from_bytes::<PacketOut>(&bytes).unwrap(), out);
        out.validate().unwrap();
    }

    #[test]
    fn buffered_packet_out_with_data_is_bad() {
        let out = PacketOut { buffer_id: 7, data: vec![1].into(), ..PacketOut::default() };
        assert_eq!(out.validate(), Err(ProtocolError::Bad(Item::PacketOut)));
    }

    #[test]
    fn packet_out_actions_len_cutting_an_action_fails() {
        let out = PacketOut { actions: [output(1)].into_iter().collect(), ..PacketOut::default() };
        let mut bytes = to_bytes(&out).unwrap().to_vec();
        bytes[9] = 8;
        assert_eq!(from_bytes::<PacketOut>(&bytes), Err(ProtocolError::Available(Item::Action)));

        bytes[9] = 40;
        assert_eq!(from_bytes::<PacketOut>(&bytes), Err(ProtocolError::Available(Item::Sequence)));
    }

    #[test]
    fn flow_mod_round_trip() {
        let flow = FlowMod::add(
            0,
            Match::new([OxmField::in_port(1), OxmField::eth_type(0x0800)]),
            [
                Instruction::new(InstructionBody::ApplyActions(Actions::new([output(2)]))),
                Instruction::new(InstructionBody::GotoTable(GotoTable { table_id: 1 })),
            ],
        );
        flow.validate().unwrap();
        let bytes = to_bytes(&flow).unwrap();
        assert_eq!(bytes.len(), flow.bytes());
        assert_eq!(from_bytes::<FlowMod>(&bytes).unwrap(), flow);
    }

    #[test]
    fn flow_mod_rules() {
        let mut flow = FlowMod { table_id: table_id::ALL, ..FlowMod::default() };
        assert_eq!(flow.validate(), Err(ProtocolError::Bad(Item::FlowMod)));
        FlowMod::delete_all().validate().unwrap();

        flow = FlowMod { flags: FlowModFlags::from_bits_retain(0x80), ..FlowMod::default() };
        assert_eq!(flow.validate(), Err(ProtocolError::Bad(Item::FlowMod)));

        let goto = |table_id| Instruction::new(InstructionBody::GotoTable(GotoTable { table_id }));
        flow = FlowMod::add(3, Match::default(), [goto(3)]);
        assert_eq!(flow.validate(), Err(ProtocolError::Bad(Item::FlowMod)));

        flow = FlowMod::add(3, Match::default(), [goto(4), goto(5)]);
        assert_eq!(flow.validate(), Err(ProtocolError::Bad(Item::FlowMod)));

        flow = FlowMod::add(3, Match::default(), [goto(4)]);
        flow.validate().unwrap();
    }

    #[test]
    fn unknown_command_is_bad() {
        let mut bytes = to_bytes(&FlowMod::default()).unwrap().to_vec();
        bytes[17] = 9;
        assert_eq!(from_bytes::<FlowMod>(&bytes), Err(ProtocolError::Bad(Item::FlowMod)));
    }

    #[test]
    fn packet_in_round_trip() {
        let packet_in = PacketIn {
            buffer_id: 12,
            total_len: 64,
            reason: PacketInReason::Action,
            table_id: 2,
            cookie: 99,
            pattern: Match::new([OxmField::in_port(4)]),
            data: vec![0; 14].into(),
        };
        let bytes = to_bytes(&packet_in).unwrap();
        assert_eq!(bytes.len(), 16 + 16 + 2 + 14);
        assert_eq!(from_bytes::<PacketIn>(&bytes).unwrap(), packet_in);
    }

    #[test]
    fn flow_removed_round_trip() {
        let removed = FlowRemoved {
            cookie: 1,
            priority: 10,
            reason: FlowRemovedReason::HardTimeout,
            duration_sec: 30,
            hard_timeout: 30,
            packet_count: 5,
            byte_count: 320,
            ..FlowRemoved::default()
        };
        let bytes = to_bytes(&removed).unwrap();
        assert_eq!(bytes.len(), 48);
        assert_eq!(from_bytes::<FlowRemoved>(&bytes).unwrap(), removed);
    }

    #[test]
    fn table_mod_config_bits() {
        TableMod { table_id: 0, config: 3 }.validate().unwrap();
        assert_eq!(TableMod { table_id: 0, config: 4 }.validate(), Err(ProtocolError::Bad(Item::TableMod)));
    }
}
